use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start_line: usize,
    pub start_column: usize,
    pub end_line: usize,
    pub end_column: usize,
}

impl Span {
    /// A span covering `width` characters on one line.
    pub fn new(line: usize, column: usize, width: usize) -> Self {
        Span {
            start_line: line,
            start_column: column,
            end_line: line,
            end_column: column + width,
        }
    }
}

impl std::ops::Add<Span> for Span {
    type Output = Span;

    fn add(self, other: Span) -> Span {
        let start = if (self.start_line, self.start_column) <= (other.start_line, other.start_column)
        {
            &self
        } else {
            &other
        };
        let end = if (self.end_line, self.end_column) >= (other.end_line, other.end_column) {
            &self
        } else {
            &other
        };

        Span {
            start_line: start.start_line,
            start_column: start.start_column,
            end_line: end.end_line,
            end_column: end.end_column,
        }
    }
}

impl std::fmt::Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{}", self.start_line, self.start_column)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_add_covers_both() {
        let a = Span::new(1, 4, 1);
        let b = Span::new(2, 1, 3);
        let joined = a + b;
        assert_eq!((joined.start_line, joined.start_column), (1, 4));
        assert_eq!((joined.end_line, joined.end_column), (2, 4));
        assert_eq!(b + a, joined);
    }

    #[test]
    fn test_add_same_line_uses_columns() {
        let gt = Span::new(3, 7, 1);
        let eq = Span::new(3, 8, 1);
        assert_eq!(gt + eq, Span::new(3, 7, 2));
    }
}
