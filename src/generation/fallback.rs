//! Placeholder score used when generation yields nothing usable.

const DEFAULT_TITLE: &str = "New Composition";

/// A two-voice score of rests, titled after the document.
pub fn placeholder_score(title: &str) -> String {
    let title = if title.trim().is_empty() {
        DEFAULT_TITLE
    } else {
        title
    };
    format!(
        "X:1\nT:{title}\nC:Anonymous\nM:4/4\nL:1/4\nK:C\nV:1 clef=treble\nz4 | z4 |\nV:2 clef=bass\nz4 | z4 |"
    )
}
