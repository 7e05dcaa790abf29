//! Text KeyValues, as used by `libraryfolders.vdf`.
//!
//! ```text
//! "libraryfolders"
//! {
//!     "0"
//!     {
//!         "path"      "C:\\Program Files (x86)\\Steam"
//!         "apps"
//!         {
//!             "228980"    "1216489498"
//!         }
//!     }
//! }
//! ```
//!
//! Parsing is done by `keyvalues-parser`, whose tree is converted into a [`KvNode`].
//! All scalars are read as strings. The parser groups values by key, so the children of an
//! object come back sorted by name, with repeated keys kept next to each other.
use std::io::Read;

use keyvalues_parser::{Value, Vdf};

use crate::err::{DeserializationError, DeserializationResult};
use crate::keyvalues::binary::MAX_DEPTH;
use crate::keyvalues::{KvNode, KvValue};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TextOptions {
    escape_sequences: bool,
}

impl TextOptions {
    pub fn new() -> Self {
        TextOptions::default()
    }

    /// Interpret `\\`, `\"`, `\n` and `\t` inside quoted strings.
    ///
    /// Off by default, which is how the Steam client writes its own files: backslashes are kept
    /// verbatim, so `"C:\\Steam"` reads as `C:\\Steam`.
    pub fn escape_sequences(mut self, enabled: bool) -> Self {
        self.escape_sequences = enabled;
        self
    }
}

pub fn from_str(input: &str) -> DeserializationResult<KvNode> {
    from_str_with_options(input, TextOptions::default())
}

pub fn from_reader<R: Read>(mut reader: R, options: TextOptions) -> DeserializationResult<KvNode> {
    let mut input = String::new();
    reader.read_to_string(&mut input)?;
    from_str_with_options(&input, options)
}

pub fn from_str_with_options(input: &str, options: TextOptions) -> DeserializationResult<KvNode> {
    let input = input.strip_prefix('\u{feff}').unwrap_or(input);

    let parsed = if options.escape_sequences {
        Vdf::parse(input)
    } else {
        Vdf::parse_raw(input)
    };
    let vdf = parsed.map_err(|e| DeserializationError::InvalidText {
        message: e.to_string(),
    })?;

    Ok(KvNode::new(vdf.key.as_ref(), convert(&vdf.value, 0)?))
}

fn convert(value: &Value<'_>, depth: usize) -> DeserializationResult<KvValue> {
    if depth > MAX_DEPTH {
        return Err(DeserializationError::MaxDepthExceeded {
            max: MAX_DEPTH,
            offset: 0,
        });
    }

    match value {
        Value::Str(s) => Ok(KvValue::String(s.to_string())),
        Value::Obj(obj) => {
            let mut children = Vec::new();
            for (key, values) in obj.iter() {
                for value in values {
                    children.push(KvNode::new(key.as_ref(), convert(value, depth + 1)?));
                }
            }
            Ok(KvValue::Object(children))
        }
    }
}
