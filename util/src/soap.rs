use super::{
    error::Error,
    value::Value,
    xml::{
        events::{BytesDecl, BytesStart, Event},
        ToXml, Writer,
    },
};

use std::{fmt, io::Cursor, str::FromStr};

pub const SOAP_1_1_ENVELOPE: &str = "http://schemas.xmlsoap.org/soap/envelope/";
pub const SOAP_1_2_ENVELOPE: &str = "http://www.w3.org/2003/05/soap-envelope";

pub const SOAP_1_1_BINDING: &str = "http://schemas.xmlsoap.org/wsdl/soap/";
pub const SOAP_1_2_BINDING: &str = "http://schemas.xmlsoap.org/wsdl/soap12/";

const ENVELOPE_PREFIX: &str = "env";
const BODY_PREFIX: &str = "ns0";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoapVersion {
    Soap11,
    Soap12,
}

impl SoapVersion {
    /// Picks the version from the namespace of a WSDL SOAP binding extension element.
    pub fn from_binding_namespace(namespace: &str) -> Option<Self> {
        match namespace {
            SOAP_1_1_BINDING => Some(Self::Soap11),
            SOAP_1_2_BINDING => Some(Self::Soap12),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Soap11 => "1.1",
            Self::Soap12 => "1.2",
        }
    }

    pub fn envelope_namespace(self) -> &'static str {
        match self {
            Self::Soap11 => SOAP_1_1_ENVELOPE,
            Self::Soap12 => SOAP_1_2_ENVELOPE,
        }
    }

    /// HTTP headers announcing a SOAP request of this version.
    pub fn http_headers(self, action: &str, encoding: &str) -> Vec<(String, String)> {
        match self {
            Self::Soap11 => vec![
                ("SOAPAction".to_owned(), format!("\"{}\"", action)),
                (
                    "Content-Type".to_owned(),
                    format!("text/xml;charset={}", encoding),
                ),
            ],

            Self::Soap12 => vec![(
                "Content-Type".to_owned(),
                format!(
                    "application/soap+xml;charset={};action=\"{}\"",
                    encoding, action
                ),
            )],
        }
    }
}

impl fmt::Display for SoapVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SoapVersion {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "1.1" => Ok(Self::Soap11),
            "1.2" => Ok(Self::Soap12),
            other => Err(Error::UnknownSoapVersion(other.to_owned())),
        }
    }
}

/// Renders document/literal request envelopes.
#[derive(Debug, Clone)]
pub struct Envelope<'a> {
    namespace: &'a str,
    version: SoapVersion,
    encoding: Option<&'a str>,
    indent: bool,
}

impl<'a> Envelope<'a> {
    pub fn new(namespace: &'a str, version: SoapVersion) -> Self {
        Self {
            namespace,
            version,
            encoding: None,
            indent: true,
        }
    }

    /// Emits an XML declaration when `encoding` is UTF-8. The rendered text is always
    /// UTF-8, so other encodings get no declaration rather than a false one.
    pub fn with_encoding(mut self, encoding: &'a str) -> Self {
        self.encoding = Some(encoding);
        self
    }

    pub fn compact(mut self) -> Self {
        self.indent = false;
        self
    }

    /// Renders `body`, which must be a mapping with exactly one key naming the wrapper element.
    pub fn render(&self, body: &Value) -> Result<String, Error> {
        let (wrapper, content) = match body {
            Value::Map(map) if map.len() == 1 => map
                .iter()
                .next()
                .ok_or_else(|| Error::InvalidBody(body.to_string()))?,
            other => return Err(Error::InvalidBody(describe(other))),
        };

        let mut writer = if self.indent {
            Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2)
        } else {
            Writer::new(Cursor::new(Vec::new()))
        };

        if let Some(encoding) = self.encoding.filter(|encoding| is_utf8(encoding)) {
            writer.write_event(Event::Decl(BytesDecl::new(
                b"1.0",
                Some(encoding.as_bytes()),
                None,
            )))?;
        }

        let envelope_name = format!("{}:Envelope", ENVELOPE_PREFIX);
        let envelope_xmlns = format!("xmlns:{}", ENVELOPE_PREFIX);
        let body_xmlns = format!("xmlns:{}", BODY_PREFIX);

        let envelope = BytesStart::owned_name(envelope_name).with_attributes([
            (envelope_xmlns.as_str(), self.version.envelope_namespace()),
            (body_xmlns.as_str(), self.namespace),
        ]);
        let header = BytesStart::owned_name(format!("{}:Header", ENVELOPE_PREFIX));
        let body_start = BytesStart::owned_name(format!("{}:Body", ENVELOPE_PREFIX));

        writer.write_event(Event::Start(envelope.to_borrowed()))?;
        writer.write_event(Event::Empty(header))?;
        writer.write_event(Event::Start(body_start.to_borrowed()))?;
        content.to_xml(&mut writer, &format!("{}:{}", BODY_PREFIX, wrapper))?;
        writer.write_event(Event::End(body_start.to_end()))?;
        writer.write_event(Event::End(envelope.to_end()))?;

        Ok(String::from_utf8(writer.into_inner().into_inner())?)
    }
}

fn is_utf8(encoding: &str) -> bool {
    encoding.eq_ignore_ascii_case("UTF-8") || encoding.eq_ignore_ascii_case("UTF8")
}

fn describe(value: &Value) -> String {
    match value {
        Value::Map(map) => format!("{} keys", map.len()),
        Value::List(_) => "a list".to_owned(),
        _ => "a scalar".to_owned(),
    }
}

/// Shorthand for [`Envelope::render`] with default settings.
pub fn render(body: &Value, namespace: &str, version: SoapVersion) -> Result<String, Error> {
    Envelope::new(namespace, version).render(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::read_value;
    use rstest::rstest;

    fn convert_temp() -> Value {
        Value::map([(
            "ConvertTemp",
            Value::map([
                ("Temperature", Value::from(30)),
                ("FromUnit", Value::from("degreeCelsius")),
                ("ToUnit", Value::from("degreeFahrenheit")),
            ]),
        )])
    }

    #[rstest]
    #[case(SoapVersion::Soap11, SOAP_1_1_ENVELOPE)]
    #[case(SoapVersion::Soap12, SOAP_1_2_ENVELOPE)]
    fn envelope_uses_version_namespace(#[case] version: SoapVersion, #[case] namespace: &str) {
        let xml = render(&convert_temp(), "http://www.webserviceX.NET/", version).unwrap();

        assert!(xml.contains(&format!("xmlns:env=\"{}\"", namespace)));
        assert!(xml.contains("xmlns:ns0=\"http://www.webserviceX.NET/\""));
    }

    #[test]
    fn compact_envelope_layout() {
        let xml = Envelope::new("urn:example", SoapVersion::Soap12)
            .compact()
            .render(&Value::map([("Ping", Value::map([("Count", 2)]))]))
            .unwrap();

        assert_eq!(
            xml,
            concat!(
                r#"<env:Envelope xmlns:env="http://www.w3.org/2003/05/soap-envelope" xmlns:ns0="urn:example">"#,
                "<env:Header/>",
                "<env:Body><ns0:Ping><ns0:Count>2</ns0:Count></ns0:Ping></env:Body>",
                "</env:Envelope>"
            )
        );
    }

    #[test]
    fn declaration_carries_encoding() {
        let xml = Envelope::new("urn:example", SoapVersion::Soap11)
            .with_encoding("utf-8")
            .compact()
            .render(&Value::map([("Ping", Value::Null)]))
            .unwrap();

        assert!(xml.starts_with(r#"<?xml version="1.0" encoding="utf-8"?>"#));
        assert!(xml.contains("<ns0:Ping/>"));
    }

    #[rstest]
    #[case("US-ASCII")]
    #[case("UTF-16")]
    fn no_declaration_for_other_encodings(#[case] encoding: &str) {
        let xml = Envelope::new("urn:example", SoapVersion::Soap11)
            .with_encoding(encoding)
            .compact()
            .render(&Value::map([("Ping", Value::Null)]))
            .unwrap();

        assert!(xml.starts_with("<env:Envelope"));
    }

    #[test]
    fn rendered_body_reads_back_in_order() {
        let xml = render(&convert_temp(), "http://www.webserviceX.NET/", SoapVersion::Soap12).unwrap();
        let document = read_value(&xml).unwrap();

        let body = document.pointer(["Envelope", "Body"]).unwrap();
        assert_eq!(
            body,
            &Value::map([(
                "ConvertTemp",
                Value::map([
                    ("Temperature", "30"),
                    ("FromUnit", "degreeCelsius"),
                    ("ToUnit", "degreeFahrenheit"),
                ]),
            )])
        );

        let keys: Vec<_> = body
            .get("ConvertTemp")
            .and_then(Value::as_map)
            .unwrap()
            .keys()
            .cloned()
            .collect();
        assert_eq!(keys, ["Temperature", "FromUnit", "ToUnit"]);
        assert_eq!(document.pointer(["Envelope", "Header"]), Some(&Value::Null));
    }

    #[rstest]
    #[case(Value::from("text"))]
    #[case(Value::map([("A", 1), ("B", 2)]))]
    #[case(Value::Map(Default::default()))]
    fn body_needs_single_wrapper(#[case] body: Value) {
        assert!(matches!(
            render(&body, "urn:example", SoapVersion::Soap11),
            Err(Error::InvalidBody(_))
        ));
    }

    #[test]
    fn headers_per_version() {
        assert_eq!(
            SoapVersion::Soap11.http_headers("urn:Act", "UTF-8"),
            vec![
                ("SOAPAction".to_owned(), "\"urn:Act\"".to_owned()),
                ("Content-Type".to_owned(), "text/xml;charset=UTF-8".to_owned()),
            ]
        );
        assert_eq!(
            SoapVersion::Soap12.http_headers("urn:Act", "UTF-8"),
            vec![(
                "Content-Type".to_owned(),
                "application/soap+xml;charset=UTF-8;action=\"urn:Act\"".to_owned()
            )]
        );
    }

    #[test]
    fn parses_version_strings() {
        assert_eq!("1.2".parse::<SoapVersion>().unwrap(), SoapVersion::Soap12);
        assert!(matches!(
            "1.3".parse::<SoapVersion>(),
            Err(Error::UnknownSoapVersion(version)) if version == "1.3"
        ));
    }
}
