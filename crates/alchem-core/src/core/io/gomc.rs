use crate::core::error::FormatErrorKind;
use crate::core::io::traits::{ReadError, TableSource, parse_numeric_row};
use crate::core::models::state::{StateDescriptor, StateLabel};
use crate::core::models::table::RawTable;
use std::io::BufRead;

/// Leading token of the column header line.
pub const HEADER_TOKEN: &str = "#Steps";
/// Name given to the first (step) column.
pub const TIME_COLUMN: &str = "time";
/// GOMC always reports these two lambda components, in this order.
pub const GOMC_LAMBDA_NAMES: [&str; 2] = ["Coulomb", "VDW"];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GomcMetadata {
    /// The window declared by the first `State <i>: ...` comment, if any.
    pub state: Option<StateDescriptor>,
}

/// Reader for GOMC free-energy output (`Free_Energy_BOX_0_*.dat`).
pub struct GomcFile;

impl TableSource for GomcFile {
    type Metadata = GomcMetadata;

    fn read_from(reader: &mut impl BufRead) -> Result<(RawTable, Self::Metadata), ReadError> {
        let mut metadata = GomcMetadata::default();
        let mut table: Option<RawTable> = None;

        for (line_num, line_res) in reader.lines().enumerate() {
            let line = line_res?;
            let line_num = line_num + 1;
            let trimmed = line.trim();

            if trimmed.is_empty() {
                continue;
            }

            if trimmed.starts_with(HEADER_TOKEN) {
                if table.is_some() {
                    return Err(ReadError::Format {
                        line: line_num,
                        kind: FormatErrorKind::DuplicateHeader,
                    });
                }
                let names = std::iter::once(TIME_COLUMN.to_string())
                    .chain(trimmed.split_whitespace().skip(1).map(str::to_string))
                    .collect();
                table = Some(RawTable::new(names));
                continue;
            }

            if trimmed.starts_with('#') {
                if metadata.state.is_none() && trimmed.contains("State") {
                    let state = parse_state_line(trimmed).map_err(|kind| ReadError::Format {
                        line: line_num,
                        kind,
                    })?;
                    metadata.state = Some(state);
                }
                continue;
            }

            let Some(table) = table.as_mut() else {
                return Err(ReadError::Format {
                    line: line_num,
                    kind: FormatErrorKind::MissingHeader,
                });
            };
            let row = parse_numeric_row(trimmed, line_num)?;
            table.push_row(&row).map_err(|e| ReadError::Format {
                line: line_num,
                kind: FormatErrorKind::FieldCount {
                    expected: e.expected,
                    found: e.found,
                },
            })?;
        }

        Ok((table.unwrap_or_default(), metadata))
    }
}

/// Parses `... State <index>: [<names> = ]<literal>` into a descriptor over the
/// GOMC lambda components.
pub fn parse_state_line(line: &str) -> Result<StateDescriptor, FormatErrorKind> {
    let invalid = |reason: &str| FormatErrorKind::StateDeclaration {
        text: line.to_string(),
        reason: reason.to_string(),
    };

    let (_, declaration) = line
        .split_once("State")
        .ok_or_else(|| invalid("missing 'State' keyword"))?;
    let (index_text, vector_text) = declaration
        .split_once(':')
        .ok_or_else(|| invalid("missing ':' after state index"))?;
    let index = index_text
        .trim()
        .parse::<usize>()
        .map_err(|_| invalid("state index is not a non-negative integer"))?;

    let literal = vector_text
        .rsplit_once(" = ")
        .map_or(vector_text, |(_, value)| value);
    let vector =
        StateLabel::parse(literal).map_err(|e| FormatErrorKind::state_literal(line, e))?;

    Ok(StateDescriptor::new(
        Some(index),
        GOMC_LAMBDA_NAMES.iter().map(|s| s.to_string()).collect(),
        vector,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const FREE_ENERGY_DAT: &str = "\
#T = 298.0000 (K), State 2: (Coulomb-lambda, VDW-lambda) = (0.2000, 1.0000)
#Steps      Total_En       dU/dL(Coulomb) dU/dL(VDW)     DelE->(0.0,1.0) DelE->(0.2,1.0) PV

5000        -2500.5        12.0           -3.5           1.25            0.0             4.0
10000       -2510.0        11.0           -3.0           1.50            0.0             4.1
";

    fn read(text: &str) -> Result<(RawTable, GomcMetadata), ReadError> {
        GomcFile::read_from(&mut Cursor::new(text))
    }

    #[test]
    fn reads_header_tokens_as_column_names() {
        let (table, _) = read(FREE_ENERGY_DAT).unwrap();
        assert_eq!(
            table.names(),
            &[
                "time",
                "Total_En",
                "dU/dL(Coulomb)",
                "dU/dL(VDW)",
                "DelE->(0.0,1.0)",
                "DelE->(0.2,1.0)",
                "PV"
            ]
        );
        assert_eq!(table.num_rows(), 2);
        assert_eq!(table.column(0), Some(&[5000.0, 10000.0][..]));
    }

    #[test]
    fn extracts_state_descriptor_from_comment() {
        let (_, metadata) = read(FREE_ENERGY_DAT).unwrap();
        let state = metadata.state.unwrap();
        assert_eq!(state.index, Some(2));
        assert_eq!(state.lambda_names, vec!["Coulomb", "VDW"]);
        assert_eq!(state.vector, StateLabel::Tuple(vec![0.2, 1.0]));
    }

    #[test]
    fn parses_bare_state_declaration() {
        let state = parse_state_line("# State 0: (0.0, 0.0)").unwrap();
        assert_eq!(state.index, Some(0));
        assert_eq!(state.vector, StateLabel::Tuple(vec![0.0, 0.0]));

        let scalar = parse_state_line("#State 4: 0.5").unwrap();
        assert_eq!(scalar.vector, StateLabel::Scalar(0.5));
    }

    #[test]
    fn rejects_malformed_state_declarations() {
        assert!(matches!(
            parse_state_line("# State x: (0.0, 0.0)"),
            Err(FormatErrorKind::StateDeclaration { .. })
        ));
        assert!(matches!(
            parse_state_line("# State 1 (0.0, 0.0)"),
            Err(FormatErrorKind::StateDeclaration { .. })
        ));
        assert!(matches!(
            parse_state_line("# State 1: os.system('ls')"),
            Err(FormatErrorKind::StateDeclaration { .. })
        ));
    }

    #[test]
    fn missing_state_comment_leaves_descriptor_empty() {
        let (table, metadata) = read("#Steps Total_En\n0 1.0\n").unwrap();
        assert!(metadata.state.is_none());
        assert_eq!(table.num_rows(), 1);
    }

    #[test]
    fn fails_on_data_before_header() {
        let err = read("0 1.0 2.0\n#Steps a b\n").unwrap_err();
        assert!(matches!(
            err,
            ReadError::Format {
                line: 1,
                kind: FormatErrorKind::MissingHeader
            }
        ));
    }

    #[test]
    fn fails_on_field_count_mismatch() {
        let err = read("#Steps a b\n0 1.0 2.0\n1 1.0\n").unwrap_err();
        assert!(matches!(
            err,
            ReadError::Format {
                line: 3,
                kind: FormatErrorKind::FieldCount {
                    expected: 3,
                    found: 2
                }
            }
        ));
    }

    #[test]
    fn fails_on_non_numeric_field() {
        let err = read("#Steps a\n0 1.0.0\n").unwrap_err();
        assert!(matches!(
            err,
            ReadError::NumericParse { line: 2, ref value } if value == "1.0.0"
        ));
    }

    #[test]
    fn fails_on_repeated_header() {
        let err = read("#Steps a\n0 1.0\n#Steps a\n").unwrap_err();
        assert!(matches!(
            err,
            ReadError::Format {
                line: 3,
                kind: FormatErrorKind::DuplicateHeader
            }
        ));
    }

    #[test]
    fn empty_file_yields_empty_table() {
        let (table, metadata) = read("").unwrap();
        assert_eq!(table.width(), 0);
        assert!(metadata.state.is_none());
    }
}
