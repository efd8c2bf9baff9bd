use regex::Regex;
use std::sync::OnceLock;

const LEGACY_IMPORT: &str = "from __future__ import print_function\n";

/// Turn `<pre>` blocks into `example` containers and drop the newlines left before their close.
pub fn format_description(desc: &str) -> String {
    static TRAILING_NEWLINES: OnceLock<Regex> = OnceLock::new();
    let trailing = TRAILING_NEWLINES.get_or_init(|| Regex::new(r"(?:\r?\n)+</div>").unwrap());

    let desc = desc
        .replace("<pre>", r#"<div class="example">"#)
        .replace("</pre>", "</div>");
    trailing.replace_all(&desc, "</div>").into_owned()
}

/// Strip comment lines from a reference solution, keeping complexity annotations.
pub fn format_solution(sol: &str) -> String {
    static ANNOTATION: OnceLock<Regex> = OnceLock::new();
    let annotation = ANNOTATION.get_or_init(|| Regex::new(r"Time:|Space:").unwrap());

    let kept = sol
        .split_inclusive('\n')
        .filter(|line| !line.starts_with('#') || annotation.is_match(line))
        .collect::<String>();
    kept.replace(LEGACY_IMPORT, "")
}
