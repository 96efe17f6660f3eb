//! CAD file classification and file-id query parsing.

use std::path::Path;

use super::id::FileId;

/// CAD formats the portal accepts for quoting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CadFileType {
    Stl,
    Stp,
    Step,
    Unknown,
}

/// Display information for a CAD file type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CadFileTypeInfo {
    pub name: &'static str,
    pub full_name: &'static str,
    pub description: &'static str,
}

impl CadFileType {
    /// Classify a file by its extension, case-insensitively.
    #[must_use]
    pub fn from_filename(filename: &str) -> Self {
        let extension = Path::new(filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some("stl") => Self::Stl,
            Some("stp") => Self::Stp,
            Some("step") => Self::Step,
            _ => Self::Unknown,
        }
    }

    /// Whether the backend can process this file.
    #[must_use]
    pub const fn is_supported(self) -> bool {
        !matches!(self, Self::Unknown)
    }

    /// MIME type sent with uploads.
    #[must_use]
    pub const fn mime_type(self) -> &'static str {
        match self {
            Self::Stl => "model/stl",
            Self::Stp | Self::Step => "model/step",
            Self::Unknown => "application/octet-stream",
        }
    }

    /// Name and description shown next to an uploaded file.
    #[must_use]
    pub const fn info(self) -> CadFileTypeInfo {
        match self {
            Self::Stl => CadFileTypeInfo {
                name: "STL",
                full_name: "Stereolithography",
                description: "3D модель для 3D печати",
            },
            Self::Stp | Self::Step => CadFileTypeInfo {
                name: "STEP",
                full_name: "Standard for the Exchange of Product Data",
                description: "Стандарт обмена данными продукта",
            },
            Self::Unknown => CadFileTypeInfo {
                name: "Неизвестный",
                full_name: "Неизвестный формат",
                description: "Неподдерживаемый формат файла",
            },
        }
    }
}

/// Parse a `files` query value into file ids.
///
/// Accepts a JSON array (`[1,2]`, `["1","2"]`) or a comma separated list
/// (`1,2`). Entries that are not integers are skipped.
#[must_use]
pub fn parse_file_ids(value: &str) -> Vec<FileId> {
    let trimmed = value.trim();
    if trimmed.starts_with('[')
        && trimmed.ends_with(']')
        && let Ok(serde_json::Value::Array(items)) = serde_json::from_str(trimmed)
    {
        return items.iter().filter_map(json_file_id).collect();
    }

    parse_file_id_list([trimmed])
}

/// Parse repeated `files` query values, each of which may itself be a
/// comma separated list.
#[must_use]
pub fn parse_file_id_list<I, S>(values: I) -> Vec<FileId>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    values
        .into_iter()
        .flat_map(|value| {
            value
                .as_ref()
                .split(',')
                .filter_map(|part| part.trim().parse::<i64>().ok())
                .collect::<Vec<_>>()
        })
        .map(FileId::new)
        .collect()
}

fn json_file_id(value: &serde_json::Value) -> Option<FileId> {
    match value {
        serde_json::Value::Number(n) => n.as_i64().map(FileId::new),
        serde_json::Value::String(s) => s.trim().parse().ok().map(FileId::new),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(values: &[i64]) -> Vec<FileId> {
        values.iter().copied().map(FileId::new).collect()
    }

    #[test]
    fn test_file_type_from_filename() {
        assert_eq!(CadFileType::from_filename("bracket.STL"), CadFileType::Stl);
        assert_eq!(CadFileType::from_filename("shaft.stp"), CadFileType::Stp);
        assert_eq!(CadFileType::from_filename("dir/housing.Step"), CadFileType::Step);
        assert_eq!(CadFileType::from_filename("drawing.pdf"), CadFileType::Unknown);
        assert_eq!(CadFileType::from_filename("noextension"), CadFileType::Unknown);
        assert_eq!(CadFileType::from_filename(""), CadFileType::Unknown);
    }

    #[test]
    fn test_file_type_info() {
        assert_eq!(CadFileType::Stp.info().name, "STEP");
        assert_eq!(CadFileType::Step.info(), CadFileType::Stp.info());
        assert!(!CadFileType::Unknown.is_supported());
    }

    #[test]
    fn test_parse_file_ids_json() {
        assert_eq!(parse_file_ids("[1,2]"), ids(&[1, 2]));
        assert_eq!(parse_file_ids(r#"["3", "x", 4]"#), ids(&[3, 4]));
    }

    #[test]
    fn test_parse_file_ids_comma_list() {
        assert_eq!(parse_file_ids("5, 6,abc,7"), ids(&[5, 6, 7]));
        assert_eq!(parse_file_ids(""), Vec::<FileId>::new());
    }

    #[test]
    fn test_parse_file_ids_broken_json_falls_back() {
        assert_eq!(parse_file_ids("[1,2"), ids(&[2]));
    }

    #[test]
    fn test_parse_file_id_list() {
        assert_eq!(parse_file_id_list(["1,2", "3"]), ids(&[1, 2, 3]));
    }
}
