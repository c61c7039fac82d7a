use serde::de::DeserializeOwned;

use std::{
    fs::{self, File},
    io::Read,
    path::Path,
    str::FromStr,
};

use crate::{
    amount::Amount,
    error::{Error, Result},
};

/// Opens an input export, reporting a missing file with its path.
pub(crate) fn open(path: impl AsRef<Path>) -> Result<File> {
    File::open(&path).map_err(|source| Error::MissingFile {
        path: path.as_ref().to_path_buf(),
        source,
    })
}

/// Deserializes every data row of a CSV export into `T`, in file order,
/// handing each one to `f` together with its line number.
///
/// The header row must contain every column named in `required`; this is
/// checked before any data row is read. Optional columns are left to `T`'s
/// serde defaults. The first error from `f` stops the fold.
pub(crate) fn fold_rows<R, T, F>(reader: R, required: &[&str], mut f: F) -> Result<()>
where
    R: Read,
    T: DeserializeOwned,
    F: FnMut(u64, T) -> Result<()>,
{
    let mut rdr = csv::Reader::from_reader(reader);
    let headers = rdr.headers()?.clone();
    if let Some(column) = required
        .iter()
        .find(|column| !headers.iter().any(|h| h == **column))
    {
        return Err(Error::MissingColumn {
            column: (*column).to_string(),
        });
    }
    for result in rdr.records() {
        let record = result?;
        let line = record.position().map_or(0, csv::Position::line);
        f(line, record.deserialize(Some(&headers))?)?;
    }
    Ok(())
}

/// Parses the numeric field `field` of the row at `line`.
pub(crate) fn parse_amount(line: u64, field: &str, raw: &str) -> Result<Amount> {
    Amount::from_str(raw).map_err(|_| Error::Parse {
        line,
        field: field.to_string(),
        value: raw.to_string(),
    })
}

/// Writes `contents` to `path`, creating any missing parent directories and
/// replacing whatever the file held before.
pub(crate) fn write_output(path: impl AsRef<Path>, contents: &str) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, contents)?;
    Ok(())
}
