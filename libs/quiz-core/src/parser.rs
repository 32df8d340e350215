//! Parser for vocabulary import files.
//!
//! # Format
//! ```text
//! EN: apple
//! JA: りんご
//! GRADE: 1
//!
//! # comments are ignored
//! EN: library
//! JA: 図書館
//! ```
//!
//! Blocks are separated by blank lines and their fields may come in any order.
//! Each field appears at most once per block. A block without `GRADE:` takes
//! the default grade passed to [`parse`].

use crate::error::ImportError;
use crate::types::RawItem;

/// Parse import content into raw items.
pub fn parse(content: &str, default_grade: Option<i32>) -> Result<Vec<RawItem>, ImportError> {
    let mut items = Vec::new();
    let mut current: Option<ItemBuilder> = None;

    for (idx, line) in content.lines().enumerate() {
        let line_num = idx + 1;

        match parse_line(line) {
            LineType::Empty => {
                if let Some(builder) = current.take() {
                    items.push(builder.build(default_grade)?);
                }
            }
            LineType::Comment => {}
            LineType::Prompt(text) => {
                let builder = current.get_or_insert_with(|| ItemBuilder::new(line_num));
                set_once(&mut builder.prompt, text.to_string(), line_num, "EN")?;
            }
            LineType::Answer(text) => {
                let builder = current.get_or_insert_with(|| ItemBuilder::new(line_num));
                set_once(&mut builder.answer, text.to_string(), line_num, "JA")?;
            }
            LineType::Grade(value) => {
                let grade = value.parse::<i32>().map_err(|_| ImportError::InvalidGrade {
                    line: line_num,
                    value: value.to_string(),
                })?;
                let builder = current.get_or_insert_with(|| ItemBuilder::new(line_num));
                set_once(&mut builder.grade, grade, line_num, "GRADE")?;
            }
            LineType::Text(text) => {
                return Err(ImportError::UnexpectedText {
                    line: line_num,
                    value: text.to_string(),
                });
            }
        }
    }

    if let Some(builder) = current {
        items.push(builder.build(default_grade)?);
    }

    Ok(items)
}

fn set_once<T>(
    slot: &mut Option<T>,
    value: T,
    line: usize,
    field: &'static str,
) -> Result<(), ImportError> {
    if slot.is_some() {
        return Err(ImportError::DuplicateField { line, field });
    }
    *slot = Some(value);
    Ok(())
}

struct ItemBuilder {
    prompt: Option<String>,
    answer: Option<String>,
    grade: Option<i32>,
    start_line: usize,
}

impl ItemBuilder {
    fn new(start_line: usize) -> Self {
        Self {
            prompt: None,
            answer: None,
            grade: None,
            start_line,
        }
    }

    fn build(self, default_grade: Option<i32>) -> Result<RawItem, ImportError> {
        let prompt_text = self
            .prompt
            .filter(|p| !p.is_empty())
            .ok_or(ImportError::MissingPrompt {
                line: self.start_line,
            })?;
        let answer_text = self
            .answer
            .filter(|a| !a.is_empty())
            .ok_or(ImportError::MissingAnswer {
                line: self.start_line,
            })?;
        let difficulty = self.grade.or(default_grade).ok_or(ImportError::MissingGrade {
            line: self.start_line,
        })?;

        Ok(RawItem {
            prompt_text,
            answer_text,
            difficulty,
            line_number: self.start_line,
        })
    }
}

enum LineType<'a> {
    Prompt(&'a str),
    Answer(&'a str),
    Grade(&'a str),
    Comment,
    Text(&'a str),
    Empty,
}

fn parse_line(line: &str) -> LineType<'_> {
    let trimmed = line.trim();

    if let Some(rest) = trimmed.strip_prefix("EN:") {
        LineType::Prompt(rest.trim())
    } else if let Some(rest) = trimmed.strip_prefix("JA:") {
        LineType::Answer(rest.trim())
    } else if let Some(rest) = trimmed.strip_prefix("GRADE:") {
        LineType::Grade(rest.trim())
    } else if trimmed.starts_with('#') {
        LineType::Comment
    } else if trimmed.is_empty() {
        LineType::Empty
    } else {
        LineType::Text(trimmed)
    }
}
