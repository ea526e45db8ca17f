use std::io::Write;
use tracing::trace;

pub use quick_xml::{events, Reader, Writer};

use events::{BytesEnd, BytesStart, BytesText, Event};

use super::{
    error::Error,
    value::{Map, Value},
};

pub trait ToXml {
    /// Writes `self` as an element (or elements) called `name`.
    fn to_xml<W: Write>(&self, writer: &mut Writer<W>, name: &str) -> Result<(), Error>;
}

impl ToXml for Value {
    fn to_xml<W: Write>(&self, writer: &mut Writer<W>, name: &str) -> Result<(), Error> {
        match self {
            Value::List(values) => {
                for value in values {
                    value.to_xml(writer, name)?;
                }
            }

            Value::Map(map) => {
                let start = BytesStart::borrowed_name(name.as_bytes());
                writer.write_event(Event::Start(start.to_borrowed()))?;

                for (key, value) in map {
                    value.to_xml(writer, &prefixed(name, key))?;
                }

                writer.write_event(Event::End(start.to_end()))?;
            }

            Value::Null => {
                writer.write_event(Event::Empty(BytesStart::borrowed_name(name.as_bytes())))?;
            }

            scalar => {
                let text = scalar.to_string();
                writer.write_event(Event::Start(BytesStart::borrowed_name(name.as_bytes())))?;
                writer.write_event(Event::Text(BytesText::from_plain_str(&text)))?;
                writer.write_event(Event::End(BytesEnd::borrowed(name.as_bytes())))?;
            }
        }

        Ok(())
    }
}

/// Children inherit the namespace prefix of their parent element.
fn prefixed(parent: &str, local_name: &str) -> String {
    match parent.split_once(':') {
        Some((prefix, _)) => format!("{}:{}", prefix, local_name),
        None => local_name.to_owned(),
    }
}

struct Node {
    name: String,
    children: Map,
    text: String,
}

impl Node {
    fn new(name: String) -> Self {
        Self {
            name,
            children: Map::new(),
            text: String::new(),
        }
    }

    fn into_value(self) -> (String, Value) {
        let value = if !self.children.is_empty() {
            Value::Map(self.children)
        } else if !self.text.is_empty() {
            Value::Text(self.text)
        } else {
            Value::Null
        };

        (self.name, value)
    }

    fn insert(&mut self, name: String, value: Value) {
        match self.children.get_mut(&name) {
            Some(Value::List(values)) => values.push(value),
            Some(existing) => {
                let first = std::mem::replace(existing, Value::Null);
                *existing = Value::List(vec![first, value]);
            }
            None => {
                self.children.insert(name, value);
            }
        }
    }
}

/// Reads an XML document into a [`Value`] keyed by local element names.
///
/// The result is a mapping holding the root element. Elements with children become
/// mappings, text-only elements become [`Value::Text`], empty elements become
/// [`Value::Null`] and repeated siblings collapse into a [`Value::List`] at the position of
/// the first of them, even when other elements sit in between. Namespace prefixes and
/// attributes are dropped.
pub fn read_value(xml: &str) -> Result<Value, Error> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut buffer = Vec::new();
    let mut stack = vec![Node::new(String::new())];

    loop {
        match reader.read_event(&mut buffer)? {
            Event::Start(start) => {
                let name = reader.decode(start.local_name())?.to_owned();
                stack.push(Node::new(name));
            }

            Event::Empty(start) => {
                let name = reader.decode(start.local_name())?.to_owned();
                if let Some(parent) = stack.last_mut() {
                    parent.insert(name, Value::Null);
                }
            }

            Event::Text(text) => {
                let unescaped = text.unescaped()?;
                let text = reader.decode(unescaped.as_ref())?;
                if let Some(node) = stack.last_mut() {
                    node.text.push_str(text);
                }
            }

            Event::End(_) => {
                let node = stack.pop().ok_or(Error::EmptyDocument)?;
                let (name, value) = node.into_value();
                match stack.last_mut() {
                    Some(parent) => parent.insert(name, value),
                    None => return Err(Error::EmptyDocument),
                }
            }

            Event::Eof => break,

            event => trace!(?event, "ignoring event"),
        }

        buffer.clear();
    }

    match stack.pop() {
        Some(root) if stack.is_empty() => {
            if root.children.is_empty() {
                Err(Error::EmptyDocument)
            } else {
                Ok(Value::Map(root.children))
            }
        }

        Some(unclosed) => Err(Error::UnexpectedEof(unclosed.name)),
        None => Err(Error::EmptyDocument),
    }
}
