//! Reader for line-based textual result files.
//!
//! ```text
//! run <run-id>
//! par <module> <name> <value>
//! scalar <module> <name> <value>
//! vector <vector-id> <module> <name>
//! statistic <module> <name>
//! histogram <module> <name>
//! field <field-name> <number>
//! bin <lower-bound> <count>
//! attr unit <unit>
//! ```
//!
//! `field`, `bin` and `attr` lines apply to the most recent item. Tokens
//! may be double-quoted to contain spaces; `#` starts a comment line.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::debug;

use crate::consts::DEFAULT_RUN_ID;
use crate::error::{ResViewError, Result};
use crate::item::{Bin, Field, ItemId, ItemKind, ResultItem};

/// An item as read from a file, before the store assigns its id.
#[derive(Clone, Debug)]
pub struct ItemRecord {
    pub kind: ItemKind,
    pub run: String,
    pub module: String,
    pub name: String,
    pub value: Option<f64>,
    pub text: Option<String>,
    pub unit: Option<String>,
    pub vector_id: Option<u32>,
    pub fields: BTreeMap<Field, f64>,
    pub bins: Vec<Bin>,
}

impl ItemRecord {
    fn new(kind: ItemKind, run: &str, module: &str, name: &str) -> Self {
        Self {
            kind,
            run: run.to_string(),
            module: module.to_string(),
            name: name.to_string(),
            value: None,
            text: None,
            unit: None,
            vector_id: None,
            fields: BTreeMap::new(),
            bins: Vec::new(),
        }
    }

    pub(crate) fn into_item(self, id: ItemId, file: &str) -> ResultItem {
        ResultItem {
            id,
            kind: self.kind,
            file: file.to_string(),
            run: self.run,
            module: self.module,
            name: self.name,
            value: self.value,
            text: self.text,
            unit: self.unit,
            vector_id: self.vector_id,
            fields: self.fields,
            bins: self.bins,
        }
    }
}

/// Parsed contents of one result file.
#[derive(Clone, Debug, Default)]
pub struct ResultFile {
    pub runs: Vec<String>,
    pub records: Vec<ItemRecord>,
}

pub fn load_result_file(path: &Path) -> Result<ResultFile> {
    let text = std::fs::read_to_string(path)?;
    let file = parse_result_file(&text)?;
    debug!(path = %path.display(), items = file.records.len(), "parsed result file");
    Ok(file)
}

pub fn parse_result_file(text: &str) -> Result<ResultFile> {
    let mut file = ResultFile::default();
    let mut run = DEFAULT_RUN_ID.to_string();

    for (i, raw) in text.lines().enumerate() {
        let line = i + 1;
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let tokens = tokenize(trimmed).map_err(|message| ResViewError::Parse { line, message })?;
        let err = |message: String| ResViewError::Parse { line, message };

        match tokens[0].as_str() {
            "run" => {
                let [_, id] = expect_args::<2>(&tokens).map_err(err)?;
                run = id.clone();
                if !file.runs.contains(&run) {
                    file.runs.push(run.clone());
                }
            }
            "par" => {
                let [_, module, name, value] = expect_args::<4>(&tokens).map_err(err)?;
                let mut record = ItemRecord::new(ItemKind::Parameter, &run, module, name);
                match value.parse::<f64>() {
                    Ok(v) => record.value = Some(v),
                    Err(_) => record.text = Some(value.clone()),
                }
                push(&mut file, &run, record);
            }
            "scalar" => {
                let [_, module, name, value] = expect_args::<4>(&tokens).map_err(err)?;
                let mut record = ItemRecord::new(ItemKind::Scalar, &run, module, name);
                record.value = Some(parse_number(value).map_err(err)?);
                push(&mut file, &run, record);
            }
            "vector" => {
                let [_, vector_id, module, name] = expect_args::<4>(&tokens).map_err(err)?;
                let mut record = ItemRecord::new(ItemKind::Vector, &run, module, name);
                record.vector_id = Some(
                    vector_id
                        .parse()
                        .map_err(|_| err(format!("invalid vector id '{vector_id}'")))?,
                );
                push(&mut file, &run, record);
            }
            "statistic" | "histogram" => {
                let [keyword, module, name] = expect_args::<3>(&tokens).map_err(err)?;
                let kind = if keyword == "statistic" {
                    ItemKind::Statistics
                } else {
                    ItemKind::Histogram
                };
                push(&mut file, &run, ItemRecord::new(kind, &run, module, name));
            }
            "field" => {
                let [_, name, value] = expect_args::<3>(&tokens).map_err(err)?;
                let field =
                    Field::parse(name).ok_or_else(|| err(format!("unknown field '{name}'")))?;
                let value = parse_number(value).map_err(err)?;
                let record = last_record(&mut file, "field").map_err(err)?;
                if !record.kind.has_fields() {
                    return Err(err(format!("{} items have no fields", record.kind)));
                }
                record.fields.insert(field, value);
            }
            "bin" => {
                let [_, lower, count] = expect_args::<3>(&tokens).map_err(err)?;
                let bin = Bin {
                    lower_bound: parse_number(lower).map_err(err)?,
                    count: parse_number(count).map_err(err)?,
                };
                let record = last_record(&mut file, "bin").map_err(err)?;
                if record.kind != ItemKind::Histogram {
                    return Err(err("bin outside of a histogram".to_string()));
                }
                record.bins.push(bin);
            }
            "attr" => {
                let [_, key, value] = expect_args::<3>(&tokens).map_err(err)?;
                let record = last_record(&mut file, "attr").map_err(err)?;
                if key == "unit" {
                    record.unit = Some(value.clone());
                }
            }
            other => return Err(err(format!("unknown keyword '{other}'"))),
        }
    }

    Ok(file)
}

fn push(file: &mut ResultFile, run: &str, record: ItemRecord) {
    if !file.runs.iter().any(|r| r == run) {
        file.runs.push(run.to_string());
    }
    file.records.push(record);
}

fn last_record<'a>(file: &'a mut ResultFile, keyword: &str) -> std::result::Result<&'a mut ItemRecord, String> {
    file.records
        .last_mut()
        .ok_or_else(|| format!("'{keyword}' before any item"))
}

fn expect_args<const N: usize>(tokens: &[String]) -> std::result::Result<&[String; N], String> {
    tokens.try_into().map_err(|_| {
        format!(
            "'{}' expects {} arguments, got {}",
            tokens[0],
            N - 1,
            tokens.len() - 1
        )
    })
}

fn parse_number(token: &str) -> std::result::Result<f64, String> {
    match token {
        "nan" => Ok(f64::NAN),
        "inf" => Ok(f64::INFINITY),
        "-inf" => Ok(f64::NEG_INFINITY),
        _ => token.parse().map_err(|_| format!("invalid number '{token}'")),
    }
}

fn tokenize(line: &str) -> std::result::Result<Vec<String>, String> {
    let mut tokens = Vec::new();
    let mut chars = line.chars().peekable();
    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }
        let mut token = String::new();
        if c == '"' {
            chars.next();
            let mut closed = false;
            while let Some(c) = chars.next() {
                match c {
                    '"' => {
                        closed = true;
                        break;
                    }
                    '\\' => {
                        if let Some(escaped) = chars.next() {
                            token.push(escaped);
                        }
                    }
                    _ => token.push(c),
                }
            }
            if !closed {
                return Err("unterminated quoted string".to_string());
            }
        } else {
            while let Some(&c) = chars.peek() {
                if c.is_whitespace() {
                    break;
                }
                token.push(c);
                chars.next();
            }
        }
        tokens.push(token);
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quoted_tokens_keep_spaces() {
        let tokens = tokenize(r#"par Net "greeting text" "a \"b\"""#).unwrap();
        assert_eq!(tokens, vec!["par", "Net", "greeting text", "a \"b\""]);
    }

    #[test]
    fn non_numeric_parameter_is_kept_as_text() {
        let file = parse_result_file("par Net.host protocol \"tcp\"\n").unwrap();
        let record = &file.records[0];
        assert_eq!(record.value, None);
        assert_eq!(record.text.as_deref(), Some("tcp"));
        assert_eq!(record.run, DEFAULT_RUN_ID);
    }

    #[test]
    fn arity_errors_carry_line_numbers() {
        let err = parse_result_file("run r1\n\nscalar Net.host sent\n").unwrap_err();
        match err {
            ResViewError::Parse { line, message } => {
                assert_eq!(line, 3);
                assert!(message.contains("expects 3 arguments"), "got: {message}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn field_on_scalar_is_rejected() {
        let err = parse_result_file("scalar Net x 1\nfield count 3\n").unwrap_err();
        assert!(matches!(err, ResViewError::Parse { line: 2, .. }));
    }

    #[test]
    fn unit_attribute_applies_to_last_item() {
        let file = parse_result_file("scalar Net delay 0.5\nattr unit s\n").unwrap();
        assert_eq!(file.records[0].unit.as_deref(), Some("s"));
    }

    #[test]
    fn unterminated_quote_is_an_error() {
        assert!(parse_result_file("par Net \"oops 1\n").is_err());
    }
}
