/// A run of message text, either plain or a recorded mention literal
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment<'a> {
    Plain(&'a str),
    Mention(&'a str),
}

/// Split `text` into plain and mention runs using the recorded literals.
///
/// At each position the longest matching literal wins, so "@Ann Lee" is not
/// cut short by a shorter "@Ann".
pub fn segments<'a, S: AsRef<str>>(text: &'a str, literals: &[S]) -> Vec<Segment<'a>> {
    let mut literals: Vec<&str> = literals
        .iter()
        .map(AsRef::as_ref)
        .filter(|l| !l.is_empty())
        .collect();
    literals.sort_by(|a, b| b.len().cmp(&a.len()));

    let mut out = Vec::new();
    let mut plain_start = 0;
    let mut pos = 0;

    while pos < text.len() {
        let rest = &text[pos..];
        if let Some(literal) = literals.iter().find(|l| rest.starts_with(**l)) {
            if plain_start < pos {
                out.push(Segment::Plain(&text[plain_start..pos]));
            }
            out.push(Segment::Mention(&text[pos..pos + literal.len()]));
            pos += literal.len();
            plain_start = pos;
        } else {
            pos += rest.chars().next().map_or(1, char::len_utf8);
        }
    }

    if plain_start < text.len() {
        out.push(Segment::Plain(&text[plain_start..]));
    }
    out
}
