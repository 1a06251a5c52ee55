//! Gherkin document reader.
//!
//! Splits feature text into a background and scenarios made of steps. Each
//! step keeps its section, its text after the keyword, any `|` table rows
//! beneath it, and an optional `"""` doc string. Clause meaning is assigned
//! later by [`crate::feature`].

use crate::error::ContractError;
use std::fmt;

/// Logical section of a step; `And`/`But` continue the previous one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GherkinSection {
    Given,
    When,
    Then,
    Star,
}

impl GherkinSection {
    /// Keyword that opens the section when rendered.
    pub fn keyword(self) -> &'static str {
        match self {
            GherkinSection::Given => "Given",
            GherkinSection::When => "When",
            GherkinSection::Then => "Then",
            GherkinSection::Star => "*",
        }
    }
}

impl fmt::Display for GherkinSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub section: GherkinSection,
    pub text: String,
    pub line: usize,
    pub table: Vec<String>,
    pub doc_string: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExamplesBlock {
    pub line: usize,
    pub rows: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioBlock {
    pub name: String,
    pub line: usize,
    pub steps: Vec<Step>,
    pub examples: Vec<ExamplesBlock>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct GherkinDocument {
    pub feature: String,
    pub background: Vec<Step>,
    pub scenarios: Vec<ScenarioBlock>,
}

enum Block {
    None,
    Background,
    Scenario,
    Examples,
}

const STEP_KEYWORDS: [(&str, Option<GherkinSection>); 6] = [
    ("Given ", Some(GherkinSection::Given)),
    ("When ", Some(GherkinSection::When)),
    ("Then ", Some(GherkinSection::Then)),
    ("* ", Some(GherkinSection::Star)),
    ("And ", None),
    ("But ", None),
];

fn step_keyword(line: &str) -> Option<(Option<GherkinSection>, &str)> {
    STEP_KEYWORDS.iter().find_map(|(keyword, section)| {
        line.strip_prefix(keyword).map(|rest| (*section, rest.trim()))
    })
}

fn heading<'a>(line: &'a str, keywords: &[&str]) -> Option<&'a str> {
    keywords
        .iter()
        .find_map(|keyword| line.strip_prefix(keyword))
        .map(str::trim)
}

/// Parse feature text into its blocks and steps.
pub fn parse_document(text: &str) -> Result<GherkinDocument, ContractError> {
    let mut document = GherkinDocument::default();
    let mut block = Block::None;
    let mut last_section = GherkinSection::Given;
    let mut lines = text.lines().enumerate().map(|(index, line)| (index + 1, line));

    while let Some((number, raw)) = lines.next() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some(name) = heading(line, &["Feature:"]) {
            document.feature = name.to_string();
            block = Block::None;
        } else if heading(line, &["Background:"]).is_some() {
            block = Block::Background;
            last_section = GherkinSection::Given;
        } else if let Some(name) = heading(line, &["Scenario Outline:", "Scenario Template:", "Scenario:"]) {
            document.scenarios.push(ScenarioBlock {
                name: name.to_string(),
                line: number,
                steps: Vec::new(),
                examples: Vec::new(),
            });
            block = Block::Scenario;
            last_section = GherkinSection::Given;
        } else if heading(line, &["Examples:", "Scenarios:"]).is_some() {
            let scenario = document
                .scenarios
                .last_mut()
                .ok_or_else(|| ContractError::compile(number, "Examples outside a scenario"))?;
            scenario.examples.push(ExamplesBlock {
                line: number,
                rows: Vec::new(),
            });
            block = Block::Examples;
        } else if line.starts_with('|') {
            match block {
                Block::Examples => {
                    if let Some(examples) = document
                        .scenarios
                        .last_mut()
                        .and_then(|scenario| scenario.examples.last_mut())
                    {
                        examples.rows.push(line.to_string());
                    }
                }
                _ => {
                    let step = current_steps(&mut document, &block)
                        .and_then(|steps| steps.last_mut())
                        .ok_or_else(|| ContractError::compile(number, "table without a step"))?;
                    step.table.push(line.to_string());
                }
            }
        } else if line.starts_with("\"\"\"") {
            let indent = raw.chars().take_while(|c| c.is_whitespace()).count();
            let mut content = Vec::new();
            let mut closed = false;
            for (_, doc_line) in lines.by_ref() {
                if doc_line.trim() == "\"\"\"" {
                    closed = true;
                    break;
                }
                content.push(strip_indent(doc_line, indent));
            }
            if !closed {
                return Err(ContractError::compile(number, "unterminated doc string"));
            }
            let step = current_steps(&mut document, &block)
                .and_then(|steps| steps.last_mut())
                .ok_or_else(|| ContractError::compile(number, "doc string without a step"))?;
            step.doc_string = Some(content.join("\n"));
        } else if let Some((section, rest)) = step_keyword(line) {
            if matches!(block, Block::Examples) {
                block = Block::Scenario;
            }
            let section = section.unwrap_or(last_section);
            last_section = section;
            let steps = current_steps(&mut document, &block)
                .ok_or_else(|| ContractError::compile(number, "step outside a scenario"))?;
            steps.push(Step {
                section,
                text: rest.to_string(),
                line: number,
                table: Vec::new(),
                doc_string: None,
            });
        }
        // Anything else is free-form description text.
    }

    Ok(document)
}

/// Drop up to `indent` leading whitespace characters.
fn strip_indent(line: &str, indent: usize) -> &str {
    let offset = line
        .char_indices()
        .take_while(|(_, c)| c.is_whitespace())
        .take(indent)
        .last()
        .map_or(0, |(index, c)| index + c.len_utf8());
    &line[offset..]
}

fn current_steps<'a>(document: &'a mut GherkinDocument, block: &Block) -> Option<&'a mut Vec<Step>> {
    match block {
        Block::Background => Some(&mut document.background),
        Block::Scenario => document.scenarios.last_mut().map(|scenario| &mut scenario.steps),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEXT: &str = r#"
Feature: Orders

  # shared types
  Background:
    Given type Order
      | id | (number) |

  Scenario Outline: Fetch an order
    When GET /orders/(id:number)
    And request-header Accept (string)
    Then status 200
    And response-body (Order)

    Examples:
      | id |
      | 10 |

  Scenario: Post a note
    When POST /notes
    And request-body
      """
      <note>(string)</note>
      """
    Then status 201
"#;

    #[test]
    fn test_feature_and_blocks() {
        let document = parse_document(TEXT).unwrap();
        assert_eq!(document.feature, "Orders");
        assert_eq!(document.background.len(), 1);
        assert_eq!(document.background[0].table, vec!["| id | (number) |"]);
        assert_eq!(document.scenarios.len(), 2);
        assert_eq!(document.scenarios[0].name, "Fetch an order");
    }

    #[test]
    fn test_and_continues_the_previous_section() {
        let document = parse_document(TEXT).unwrap();
        let sections: Vec<_> = document.scenarios[0].steps.iter().map(|s| s.section).collect();
        assert_eq!(
            sections,
            vec![
                GherkinSection::When,
                GherkinSection::When,
                GherkinSection::Then,
                GherkinSection::Then
            ]
        );
    }

    #[test]
    fn test_examples_rows_are_collected() {
        let document = parse_document(TEXT).unwrap();
        assert_eq!(document.scenarios[0].examples[0].rows, vec!["| id |", "| 10 |"]);
    }

    #[test]
    fn test_doc_string_attaches_to_step() {
        let document = parse_document(TEXT).unwrap();
        let step = &document.scenarios[1].steps[1];
        assert_eq!(step.text, "request-body");
        assert_eq!(step.doc_string.as_deref(), Some("<note>(string)</note>"));
    }

    #[test]
    fn test_unterminated_doc_string_is_an_error() {
        let text = "Feature: x\nScenario: y\n  When POST /a\n  And request-body\n  \"\"\"\n  {}\n";
        assert!(matches!(
            parse_document(text),
            Err(ContractError::Compile { line: 5, .. })
        ));
    }

    #[test]
    fn test_doc_string_with_non_ascii_indent() {
        let text = "Feature: x\nScenario: y\n  When POST /a\n  And request-body\n      \"\"\"\n     \u{a0}\u{a0}hello\n      \"\"\"\n";
        let document = parse_document(text).unwrap();
        let step = &document.scenarios[0].steps[1];
        assert_eq!(step.doc_string.as_deref(), Some("\u{a0}hello"));
    }
}
