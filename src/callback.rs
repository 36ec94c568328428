use std::fmt;

/// Which paginated inline list a navigation button belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Picker {
    Tests,
    Library,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Prev,
    Next,
}

/// Parsed `callback_data` of every inline button the bot sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackAction {
    StartQuiz(i64),
    GetPdf(i64),
    Page {
        picker: Picker,
        direction: Direction,
        from: usize,
    },
    Answer {
        question: usize,
        option: usize,
    },
    Noop,
}

impl Picker {
    fn prefix(self) -> &'static str {
        match self {
            Picker::Tests => "test",
            Picker::Library => "lib",
        }
    }
}

impl CallbackAction {
    pub fn parse(data: &str) -> Option<Self> {
        if data == "noop" {
            return Some(Self::Noop);
        }

        let mut parts = data.split('_');
        let action = match (parts.next()?, parts.next()?, parts.next()) {
            ("startquiz", id, None) => Self::StartQuiz(id.parse().ok()?),
            ("getpdf", id, None) => Self::GetPdf(id.parse().ok()?),
            ("ans", question, Some(option)) => Self::Answer {
                question: question.parse().ok()?,
                option: option.parse().ok()?,
            },
            (prefix @ ("test" | "lib"), direction, Some(page)) => Self::Page {
                picker: if prefix == "test" {
                    Picker::Tests
                } else {
                    Picker::Library
                },
                direction: match direction {
                    "prev" => Direction::Prev,
                    "next" => Direction::Next,
                    _ => return None,
                },
                from: page.parse().ok()?,
            },
            _ => return None,
        };

        if parts.next().is_some() {
            return None;
        }
        Some(action)
    }

    /// Page a navigation button leads to; never below the first one.
    pub fn target_page(&self) -> Option<usize> {
        match *self {
            Self::Page {
                direction: Direction::Prev,
                from,
                ..
            } => Some(from.saturating_sub(1).max(1)),
            Self::Page {
                direction: Direction::Next,
                from,
                ..
            } => Some(from.saturating_add(1)),
            _ => None,
        }
    }
}

impl fmt::Display for CallbackAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StartQuiz(id) => write!(f, "startquiz_{id}"),
            Self::GetPdf(id) => write!(f, "getpdf_{id}"),
            Self::Page {
                picker,
                direction,
                from,
            } => {
                let direction = match direction {
                    Direction::Prev => "prev",
                    Direction::Next => "next",
                };
                write!(f, "{}_{}_{}", picker.prefix(), direction, from)
            }
            Self::Answer { question, option } => write!(f, "ans_{question}_{option}"),
            Self::Noop => write!(f, "noop"),
        }
    }
}
