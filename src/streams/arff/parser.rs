use crate::core::attributes::{AttributeRef, NominalAttribute, NumericAttribute};
use crate::core::instance_header::InstanceHeader;
use crate::utils::file_parsing::{split_csv_preserving_quotes, strip_surrounding_quotes};
use std::io::{BufRead, Error, ErrorKind, Seek};
use std::sync::Arc;

#[derive(Debug, PartialEq)]
pub(super) enum AttributeKind {
    Numeric,
    Nominal(Vec<String>),
}

enum Directive<'a> {
    Relation(&'a str),
    Attribute,
    Data,
    Unknown,
}

pub(super) fn is_comment_or_empty(s: &str) -> bool {
    let t = s.trim();
    t.is_empty() || t.starts_with('%')
}

fn invalid_data(message: impl Into<String>) -> Error {
    Error::new(ErrorKind::InvalidData, message.into())
}

/// Case-insensitive `@keyword` prefix match that returns the rest of the line.
fn strip_keyword<'a>(line: &'a str, keyword: &str) -> Option<&'a str> {
    let head = line.get(..keyword.len())?;
    head.eq_ignore_ascii_case(keyword)
        .then(|| &line[keyword.len()..])
}

fn directive(line: &str) -> Directive<'_> {
    let line = line.trim();
    if let Some(rest) = strip_keyword(line, "@relation") {
        Directive::Relation(strip_surrounding_quotes(rest.trim()))
    } else if strip_keyword(line, "@attribute").is_some() {
        Directive::Attribute
    } else if strip_keyword(line, "@data").is_some() {
        Directive::Data
    } else {
        Directive::Unknown
    }
}

/// Reads the header up to and including `@data` and returns it with the byte
/// offset of the first data line. The class is the last attribute unless
/// `class_index` says otherwise, and it must be nominal.
pub(super) fn parse_header<R: BufRead + Seek>(
    reader: &mut R,
    class_index: Option<usize>,
) -> Result<(InstanceHeader, u64), Error> {
    let mut relation: Option<String> = None;
    let mut attributes: Vec<AttributeRef> = Vec::new();
    let mut line = String::new();

    let data_start_pos = loop {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            return Err(Error::new(
                ErrorKind::UnexpectedEof,
                "ARFF file ended before @data",
            ));
        }
        if is_comment_or_empty(&line) {
            continue;
        }
        match directive(&line) {
            Directive::Relation(name) if relation.is_none() && attributes.is_empty() => {
                relation = Some(name.to_string());
            }
            Directive::Relation(_) => {
                return Err(invalid_data("@relation must come before the attributes"));
            }
            Directive::Attribute => attributes.push(build_attribute(&line)?),
            Directive::Data => break reader.stream_position()?,
            Directive::Unknown => {
                return Err(invalid_data(format!(
                    "Unsupported header directive: {}",
                    line.trim()
                )));
            }
        }
    };

    if attributes.is_empty() {
        return Err(invalid_data("ARFF header declares no attributes"));
    }
    let class_index = class_index.unwrap_or(attributes.len() - 1);
    let Some(class_attribute) = attributes.get(class_index) else {
        return Err(Error::new(
            ErrorKind::InvalidInput,
            format!(
                "Class index {class_index} is out of range for {} attributes",
                attributes.len()
            ),
        ));
    };
    if !class_attribute.is_nominal() {
        return Err(invalid_data(format!(
            "Class attribute '{}' must be nominal",
            class_attribute.name()
        )));
    }

    let header = InstanceHeader::new(
        relation.unwrap_or_else(|| "unnamed_relation".to_string()),
        attributes,
        class_index,
    );
    Ok((header, data_start_pos))
}

fn build_attribute(line: &str) -> Result<AttributeRef, Error> {
    let (name, kind) = parse_attribute_line(line)?;
    Ok(match kind {
        AttributeKind::Numeric => Arc::new(NumericAttribute::new(name)),
        AttributeKind::Nominal(values) => Arc::new(NominalAttribute::from_labels(name, values)),
    })
}

pub(super) fn parse_attribute_line(line: &str) -> Result<(String, AttributeKind), Error> {
    let rest = strip_keyword(line.trim(), "@attribute")
        .ok_or_else(|| invalid_data("Line is not '@attribute'"))?
        .trim();

    let (name, declaration) = match rest.chars().next() {
        Some(quote @ ('\'' | '"')) => {
            let end = rest[1..]
                .find(quote)
                .map(|i| i + 1)
                .ok_or_else(|| invalid_data("Attribute name without closing quote marks"))?;
            (rest[1..end].to_string(), rest[end + 1..].trim())
        }
        _ => {
            let (name, declaration) = rest
                .split_once(char::is_whitespace)
                .ok_or_else(|| invalid_data("Attribute type is missing"))?;
            (name.to_string(), declaration.trim())
        }
    };

    let lowered = declaration.to_ascii_lowercase();
    if ["numeric", "real", "integer"]
        .iter()
        .any(|t| lowered.starts_with(t))
    {
        return Ok((name, AttributeKind::Numeric));
    }

    if let Some(domain) = declaration.strip_prefix('{') {
        let close = domain
            .rfind('}')
            .ok_or_else(|| invalid_data("Nominal set without closing '}'"))?;
        let values: Vec<String> = split_csv_preserving_quotes(&domain[..close])
            .iter()
            .map(|v| strip_surrounding_quotes(v).to_string())
            .filter(|v| !v.is_empty())
            .collect();
        if values.is_empty() {
            return Err(invalid_data("Empty nominal domain"));
        }
        return Ok((name, AttributeKind::Nominal(values)));
    }

    Err(invalid_data(format!(
        "Attribute kind not supported: {declaration}"
    )))
}

/// Converts one data row into internal values: numeric as parsed, nominal as
/// the label index, `?` as NaN.
pub(super) fn parse_instance_values(
    header: &InstanceHeader,
    line: &str,
) -> Result<Vec<f64>, Error> {
    let tokens = split_csv_preserving_quotes(line);
    if tokens.len() != header.number_of_attributes() {
        return Err(invalid_data(format!(
            "Number of columns ({}) differs from number of attributes ({})",
            tokens.len(),
            header.number_of_attributes()
        )));
    }

    tokens
        .iter()
        .enumerate()
        .map(|(idx, token)| {
            let token = token.trim();
            if token == "?" {
                return Ok(f64::NAN);
            }
            let attribute = header
                .attribute_at_index(idx)
                .ok_or_else(|| invalid_data(format!("No attribute at column #{idx}")))?;
            if let Some(nominal) = attribute.as_any().downcast_ref::<NominalAttribute>() {
                let label = strip_surrounding_quotes(token);
                return nominal
                    .index_of_value(label)
                    .map(|i| i as f64)
                    .ok_or_else(|| {
                        invalid_data(format!(
                            "Nominal value '{label}' not found in domain of attribute #{idx}"
                        ))
                    });
            }
            if attribute.as_any().is::<NumericAttribute>() {
                return token.parse::<f64>().map_err(|_| {
                    invalid_data(format!(
                        "Invalid numeric value '{token}' for attribute #{idx}"
                    ))
                });
            }
            Err(invalid_data(format!(
                "Unsupported attribute type at column #{idx}"
            )))
        })
        .collect()
}
