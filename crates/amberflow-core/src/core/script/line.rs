pub const COMMENT_MARKER: char = '#';

/// One line of a script with its trailing comment split off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScriptLine<'a> {
    /// 1-based line number within the script.
    pub number: usize,
    pub raw: &'a str,
    /// Text before the first comment marker.
    pub head: &'a str,
}

impl<'a> ScriptLine<'a> {
    pub fn new(number: usize, raw: &'a str) -> Self {
        let head = raw
            .split_once(COMMENT_MARKER)
            .map_or(raw, |(head, _comment)| head);
        Self { number, raw, head }
    }

    pub fn tokens(&self) -> Vec<&'a str> {
        self.head.split_whitespace().collect()
    }

    pub fn is_blank(&self) -> bool {
        self.head.trim().is_empty()
    }
}

pub fn script_lines(text: &str) -> impl Iterator<Item = ScriptLine<'_>> {
    text.lines()
        .enumerate()
        .map(|(index, raw)| ScriptLine::new(index + 1, raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn head_excludes_trailing_comment() {
        let line = ScriptLine::new(3, "saveAmberParm x a.prmtop a.inpcrd  # final step");
        assert_eq!(line.head, "saveAmberParm x a.prmtop a.inpcrd  ");
        assert_eq!(line.tokens(), vec!["saveAmberParm", "x", "a.prmtop", "a.inpcrd"]);
        assert_eq!(line.number, 3);
    }

    #[test]
    fn full_line_comment_is_blank() {
        let line = ScriptLine::new(1, "# mol = loadpdb hidden.pdb");
        assert!(line.is_blank());
        assert!(line.tokens().is_empty());
    }

    #[test]
    fn line_without_comment_keeps_everything() {
        let line = ScriptLine::new(1, "quit");
        assert_eq!(line.head, "quit");
        assert!(!line.is_blank());
    }

    #[test]
    fn script_lines_are_numbered_from_one() {
        let numbers: Vec<usize> = script_lines("a\n\nb\n").map(|l| l.number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
    }
}
