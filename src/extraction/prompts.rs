pub(super) const OUTLINE_SYSTEM_PROMPT: &str = "You analyze long structured documents and produce tables of contents as Markdown headings, each followed by a short quoted snippet copied from the document. Never reproduce large blocks of text.";

pub(super) const REFERENCE_SYSTEM_PROMPT: &str = "Return only the JSON object requested.";

const HEADING_FORMAT: &str = "Use Markdown headings (#, ##, ###, ####, #####, ######) for levels 1 to 6. On the line right after each heading, write a double-quoted snippet of 12 to 15 consecutive words that follow the heading, copied exactly as they appear in the document. The snippet is used to find the section in the original text.";

pub(super) fn first_pass_instructions() -> String {
    format!(
        "List the top-level (level 1) headings of the document below as Markdown.

{HEADING_FORMAT}

Example. For a document containing:
CHAPTER I
General provisions
1. This Regulation lays down rules relating to the protection of natural persons

return:
# CHAPTER I
\"General provisions This Regulation lays down rules relating to the protection of natural persons\"

Rules:
1. Treat any structural heading or section title as a heading.
2. Every snippet has 12 to 15 words.
3. Keep document order.
4. Copy words exactly; do not skip or rephrase.
5. Output headings and snippets only."
    )
}

pub(super) fn next_pass_instructions(pass_number: usize, current_outline: &str) -> String {
    let previous_pass = pass_number.saturating_sub(1);
    format!(
        "Extend the table of contents below by exactly one more level of sub-headings.

Current table of contents (pass {previous_pass}):
{current_outline}

{HEADING_FORMAT}

Keep every existing heading and snippet unchanged and in place. Insert each new sub-heading, with one more '#' than its parent, directly under the heading it belongs to. Headings without sub-headings stay as they are. If the document has no further sub-headings anywhere, return the current table of contents exactly as given.

Rules:
1. Treat any structural heading or section title as a heading.
2. Every snippet has 12 to 15 words.
3. Keep document order.
4. Copy words exactly; do not skip or rephrase.
5. Output headings and snippets only."
    )
}

pub(super) fn reference_prompt(outline_markdown: &str, tagged_text: &str) -> String {
    format!(
        "Find every cross-reference between sections of the document below.

You get:
1. A table of contents whose headings carry {{#id}} anchors.
2. The document text, each section wrapped in [START SECTION id: title] and [END SECTION id: title] markers.

For every section, list the ids of all other sections its own text refers to, for example \"Section 2.01\", \"Article III\", \"Schedule 1.01(b)\", \"as defined in ...\", \"pursuant to ...\", \"subject to ...\", \"in accordance with ...\". Resolve each reference to a section id using the table of contents.

Answer with one JSON object of this shape and nothing else:
{{\"refs\": [{{\"from\": \"h1\", \"to\": [\"h22\", \"h35\"]}}, {{\"from\": \"h22\", \"to\": [\"h1\"]}}]}}

Use the exact ids from the markers. Check every section.

--- TABLE OF CONTENTS ---
{outline_markdown}
--- END TABLE OF CONTENTS ---

--- TAGGED DOCUMENT ---
{tagged_text}
--- END TAGGED DOCUMENT ---"
    )
}
