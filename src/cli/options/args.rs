//! Types for argument values.

use std::{error, fmt, io};
use std::fs::File;
use std::io::BufReader;
use std::marker::PhantomData;
use std::str::FromStr;

//------------ JsonFile ------------------------------------------------------

/// A JSON document read from the file given as the argument.
///
/// A path of `-` reads the document from stdin.
#[derive(Clone, Debug)]
pub struct JsonFile<T, Msg> {
    pub content: T,
    marker: PhantomData<Msg>,
}

impl<T, Msg> FromStr for JsonFile<T, Msg>
where
    T: serde::de::DeserializeOwned,
    Msg: Default + fmt::Display,
{
    type Err = JsonFileError<Msg>;

    fn from_str(path: &str) -> Result<Self, Self::Err> {
        let content = if path == "-" {
            serde_json::from_reader::<_, T>(BufReader::new(io::stdin().lock()))
        } else {
            let file = File::open(path).map_err(|err| JsonFileError::Io(path.into(), Default::default(), err))?;
            serde_json::from_reader::<_, T>(BufReader::new(file))
        };

        content
            .map(|content| Self {
                content,
                marker: PhantomData,
            })
            .map_err(|err| JsonFileError::Parse(path.into(), Default::default(), err))
    }
}

//------------ Messages ------------------------------------------------------

macro_rules! json_file_msg {
    ($name:ident, $msg:expr) => {
        #[derive(Clone, Copy, Debug, Default)]
        pub struct $name;

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str($msg)
            }
        }
    };
}

json_file_msg!(InputMsg, "input");
json_file_msg!(PriorStateMsg, "prior state");

//============ ErrorTypes ====================================================

//------------ JsonFileError -------------------------------------------------

#[derive(Debug)]
pub enum JsonFileError<Msg> {
    Io(String, Msg, io::Error),
    Parse(String, Msg, serde_json::Error),
}

impl<Msg: fmt::Display> fmt::Display for JsonFileError<Msg> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Io(path, msg, err) => {
                write!(f, "Failed to read {} file '{}': {}", msg, path, err)
            }
            Self::Parse(path, msg, err) => {
                write!(f, "Failed to parse {} file '{}': {}", msg, path, err)
            }
        }
    }
}

impl<Msg: fmt::Display + fmt::Debug> error::Error for JsonFileError<Msg> {}

//------------ Tests ---------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::io::Write;

    use serde_json::Value;

    use super::*;

    #[test]
    fn read_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"group_name": "pim_readers"}}"#).unwrap();

        let path = file.path().to_str().unwrap();
        let json = JsonFile::<Value, InputMsg>::from_str(path).unwrap();
        assert_eq!(json.content["group_name"], "pim_readers");
    }

    #[test]
    fn name_the_failing_file() {
        let err = JsonFile::<Value, PriorStateMsg>::from_str("/nonexistent/prior.json").unwrap_err();
        assert!(err.to_string().starts_with("Failed to read prior state file '/nonexistent/prior.json'"));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        let err = JsonFile::<Value, InputMsg>::from_str(file.path().to_str().unwrap()).unwrap_err();
        assert!(matches!(err, JsonFileError::Parse(_, _, _)));
    }
}
