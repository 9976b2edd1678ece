use crate::core::error::FormatErrorKind;
use crate::core::io::traits::{ReadError, TableSource, parse_numeric_row};
use crate::core::models::table::RawTable;
use std::collections::BTreeMap;
use std::io::BufRead;

const DEFAULT_TIME_NAME: &str = "Time";

/// Header information carried by the `@` directives of an XVG file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct XvgMetadata {
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub xaxis_label: Option<String>,
    pub yaxis_label: Option<String>,
    /// Data set legends, `s0` first. Column `i + 1` of the table is `legends[i]`.
    pub legends: Vec<String>,
}

/// Reader for Grace/XVG files as written by GROMACS.
///
/// Only the first data set is read; a `&` line ends it.
pub struct XvgFile;

impl TableSource for XvgFile {
    type Metadata = XvgMetadata;

    fn read_from(reader: &mut impl BufRead) -> Result<(RawTable, Self::Metadata), ReadError> {
        let mut metadata = XvgMetadata::default();
        let mut legends: BTreeMap<usize, String> = BTreeMap::new();
        let mut table: Option<RawTable> = None;

        for (line_num, line_res) in reader.lines().enumerate() {
            let line = line_res?;
            let line_num = line_num + 1;
            let trimmed = line.trim();

            if trimmed.is_empty() {
                continue;
            }
            if trimmed.starts_with('#') {
                continue;
            }
            if let Some(directive) = trimmed.strip_prefix('@') {
                parse_directive(
                    directive.trim(),
                    line_num,
                    table.is_some(),
                    &mut metadata,
                    &mut legends,
                )?;
                continue;
            }
            if trimmed.starts_with('&') {
                break;
            }

            let row = parse_numeric_row(trimmed, line_num)?;
            if table.is_none() {
                table = Some(new_table(&metadata, &legends, Some(row.len()), line_num)?);
            }
            if let Some(table) = table.as_mut() {
                table.push_row(&row).map_err(|e| ReadError::Format {
                    line: line_num,
                    kind: FormatErrorKind::FieldCount {
                        expected: e.expected,
                        found: e.found,
                    },
                })?;
            }
        }

        let table = match table {
            Some(t) => t,
            None => new_table(&metadata, &legends, None, 0)?,
        };
        metadata.legends = legends.into_values().collect();
        Ok((table, metadata))
    }
}

fn new_table(
    metadata: &XvgMetadata,
    legends: &BTreeMap<usize, String>,
    first_row_width: Option<usize>,
    line_num: usize,
) -> Result<RawTable, ReadError> {
    let time_name = metadata
        .xaxis_label
        .clone()
        .unwrap_or_else(|| DEFAULT_TIME_NAME.to_string());
    let mut names = vec![time_name];

    if legends.is_empty() {
        let data_sets = first_row_width.map_or(0, |w| w.saturating_sub(1));
        names.extend((0..data_sets).map(|i| format!("s{}", i)));
    } else {
        for i in 0..legends.len() {
            let legend = legends.get(&i).ok_or(ReadError::Format {
                line: line_num,
                kind: FormatErrorKind::MissingLegend(i),
            })?;
            names.push(legend.clone());
        }
    }
    Ok(RawTable::new(names))
}

fn parse_directive(
    directive: &str,
    line_num: usize,
    data_started: bool,
    metadata: &mut XvgMetadata,
    legends: &mut BTreeMap<usize, String>,
) -> Result<(), ReadError> {
    let malformed = || ReadError::Format {
        line: line_num,
        kind: FormatErrorKind::Directive(directive.to_string()),
    };

    let (keyword, rest) = directive
        .split_once(char::is_whitespace)
        .map(|(k, r)| (k, r.trim()))
        .unwrap_or((directive, ""));

    match keyword {
        "title" => metadata.title = Some(quoted(rest).ok_or_else(malformed)?),
        "subtitle" => metadata.subtitle = Some(quoted(rest).ok_or_else(malformed)?),
        "xaxis" | "yaxis" => {
            if let Some(label) = rest.strip_prefix("label") {
                let label = quoted(label).ok_or_else(malformed)?;
                if keyword == "xaxis" {
                    metadata.xaxis_label = Some(label);
                } else {
                    metadata.yaxis_label = Some(label);
                }
            }
        }
        _ => {
            let Some(set_id) = keyword
                .strip_prefix('s')
                .and_then(|id| id.parse::<usize>().ok())
            else {
                return Ok(());
            };
            let Some(legend) = rest.strip_prefix("legend") else {
                return Ok(());
            };
            if data_started {
                return Err(malformed());
            }
            legends.insert(set_id, quoted(legend).ok_or_else(malformed)?);
        }
    }
    Ok(())
}

fn quoted(text: &str) -> Option<String> {
    let start = text.find('"')?;
    let end = text.rfind('"')?;
    (end > start).then(|| text[start + 1..end].to_string())
}
