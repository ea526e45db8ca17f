use lather_util::SoapVersion;
use quick_xml::{
    events::{attributes::Attributes, BytesStart, BytesText, Event},
    Reader,
};
use std::{
    collections::{HashMap, HashSet},
    io::{BufRead, BufReader},
};
use tracing::{debug, trace, warn};
use url::Url;

use super::{
    error::Error,
    types::{
        Binding, BindingOperation, Definition, Field, FieldKind, Message, Operation, Part,
        PartKind, Port, PortType, QName, Reference, Service, Style, Type, TypeKind,
    },
};

pub const XSD_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema";
const WSDL_NAMESPACE: &str = "http://schemas.xmlsoap.org/wsdl/";

fn get_attributes<B: BufRead, const N: usize>(
    reader: &Reader<B>,
    attributes: Attributes<'_>,
    names: [&'static str; N],
) -> Result<[Option<String>; N], Error> {
    const INIT: Option<String> = None;
    let mut result = [INIT; N];

    for attribute in attributes {
        let attribute = attribute?;
        let key = reader.decode(attribute.key)?;

        for (index, name) in names.iter().enumerate() {
            if key == *name {
                let value = attribute.unescaped_value()?;
                result[index] = Some(reader.decode(value.as_ref())?.to_owned());
                break;
            }
        }
    }

    Ok(result)
}

fn required(
    value: Option<String>,
    element: &'static str,
    attribute: &'static str,
) -> Result<String, Error> {
    value.ok_or(Error::MissingAttribute { element, attribute })
}

fn split_namespaced_name(prefixed_name: &str) -> (Option<&str>, &str) {
    match prefixed_name.split_once(':') {
        Some((prefix, name)) => (Some(prefix), name),
        None => (None, prefixed_name),
    }
}

fn misplaced(element: &str) -> Error {
    Error::UnexpectedElement(element.to_owned())
}

/// Target namespaces of the enclosing definitions and schemas, and one frame of prefix
/// declarations per open element.
#[derive(Clone, Default)]
struct CurrentNamespaces {
    target: Vec<String>,
    scopes: Vec<HashMap<Option<String>, String>>,
}

struct Parser {
    definition: Definition,
    current_namespaces: CurrentNamespaces,
    visited: HashSet<Url>,
}

#[derive(Debug)]
enum ParseState {
    Definitions,

    Types,
    Schema,
    Element {
        name: String,
        kind: Option<TypeKind>,
    },
    ComplexType {
        name: Option<String>,
        kind: Option<TypeKind>,
    },
    ComplexContent {
        kind: Option<TypeKind>,
    },
    ComplexExtension {
        base: QName,
        fields: Vec<Field>,
    },
    SimpleContent {
        ty: Option<QName>,
    },
    SimpleExtension {
        ty: QName,
    },
    Sequence(Vec<Field>),
    SequenceElement {
        name: String,
        ty: Option<FieldKind>,
    },
    SimpleType {
        name: Option<String>,
        ty: Option<QName>,
    },
    Restriction {
        ty: QName,
    },

    Message {
        name: String,
        parts: Vec<Part>,
    },
    Part(Part),

    PortType {
        name: String,
        operations: Vec<Operation>,
    },
    Operation {
        name: String,
        documentation: Option<String>,
        input: Option<QName>,
        output: Option<QName>,
    },
    Documentation(Option<String>),
    Input {
        message: QName,
    },
    Output {
        message: QName,
    },

    Binding {
        name: String,
        ty: QName,
        soap_version: Option<SoapVersion>,
        style: Option<Style>,
        transport: Option<String>,
        operations: Vec<BindingOperation>,
    },
    Transport {
        soap_version: Option<SoapVersion>,
        style: Option<Style>,
        transport: Option<String>,
    },
    BindingOperation {
        name: String,
        action: Option<String>,
        style: Option<Style>,
        input: Option<String>,
        output: Option<String>,
    },
    OperationAction {
        action: Option<String>,
        style: Option<Style>,
    },
    BindingInput {
        body: Option<String>,
    },
    BindingOutput {
        body: Option<String>,
    },
    BindingBody {
        body: Option<String>,
    },

    Service {
        name: String,
        ports: Vec<Port>,
    },
    Port {
        name: String,
        binding: QName,
        address: Option<String>,
    },
    Address {
        location: String,
    },

    Import,

    Other(String),
}

impl CurrentNamespaces {
    fn push_target_namespace(&mut self, namespace: String) {
        self.target.push(namespace);
    }

    fn pop_target_namespace(&mut self) {
        self.target.pop();
    }

    fn push_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    fn add_namespace_prefix(&mut self, prefix: Option<String>, namespace: &str) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(prefix, namespace.to_owned());
        }
    }

    fn lookup(&self, prefix: &Option<String>) -> Option<&str> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(prefix))
            .map(String::as_str)
    }

    fn target_namespace(&self) -> &str {
        self.target.last().map(String::as_str).unwrap_or_default()
    }

    fn target_namespaced(&self, name: String) -> QName {
        QName::new(self.target_namespace(), name)
    }

    fn resolve(&self, prefixed_name: &str) -> Result<Reference, Error> {
        let (prefix, local_name) = split_namespaced_name(prefixed_name);

        let namespace = match prefix {
            Some(prefix) => match self.lookup(&Some(prefix.to_owned())) {
                Some(namespace) => namespace.to_owned(),
                None => return Err(Error::UnknownPrefix(prefix.to_owned())),
            },

            // Unprefixed names under the WSDL default namespace refer to this document's own
            // definitions.
            None => match self.lookup(&None) {
                Some(namespace) if namespace != WSDL_NAMESPACE => namespace.to_owned(),
                _ => self.target_namespace().to_owned(),
            },
        };

        Ok(Reference {
            declared: prefixed_name.to_owned(),
            resolved: QName::new(namespace, local_name),
        })
    }
}

impl Parser {
    fn new() -> Self {
        Self {
            definition: Default::default(),
            current_namespaces: Default::default(),
            visited: Default::default(),
        }
    }

    fn push_target_namespace(&mut self, namespace: String) {
        self.current_namespaces.push_target_namespace(namespace);
    }

    fn pop_target_namespace(&mut self) {
        self.current_namespaces.pop_target_namespace();
    }

    fn add_namespace_prefix(&mut self, prefix: Option<String>, namespace: &str) {
        self.current_namespaces
            .add_namespace_prefix(prefix, namespace);
    }

    fn target_namespaced(&self, name: String) -> QName {
        self.current_namespaces.target_namespaced(name)
    }

    fn resolve_reference(&self, prefixed_name: &str) -> Result<Reference, Error> {
        self.current_namespaces.resolve(prefixed_name)
    }

    fn resolve_namespace(&self, prefixed_name: &str) -> Result<QName, Error> {
        Ok(self.resolve_reference(prefixed_name)?.resolved)
    }

    fn parse_url(&mut self, url: Url) -> Result<(), Error> {
        if !self.visited.insert(url.clone()) {
            debug!(%url, "already parsed, skipping");
            return Ok(());
        }

        debug!(%url, "parsing document");

        match url.scheme() {
            "file" => {
                let path = url
                    .to_file_path()
                    .map_err(|()| Error::PathConversionError(None))?;
                let xml = std::fs::read_to_string(path).map_err(Error::FileReadError)?;
                self.parse_xml(Some(&url), Reader::from_str(&xml))
            }

            "http" | "https" => {
                let response = reqwest::blocking::get(url.clone())?.error_for_status()?;
                self.parse_xml(Some(&url), Reader::from_reader(BufReader::new(response)))
            }

            other => Err(Error::UnsupportedScheme(other.into())),
        }
    }

    /// Parses an imported document with its own prefix scope, restoring the importer's
    /// scope afterwards.
    fn parse_import(&mut self, base: Option<&Url>, location: &str) -> Result<(), Error> {
        let base = match base {
            Some(base) => base,
            None => {
                warn!(location, "cannot follow import without a base URL");
                return Ok(());
            }
        };

        let url = base.join(location)?;
        let saved = std::mem::take(&mut self.current_namespaces);
        let result = self.parse_url(url);
        self.current_namespaces = saved;

        debug!(%base, "back to importing document");
        result
    }

    fn parse_xml<B: BufRead>(&mut self, url: Option<&Url>, mut reader: Reader<B>) -> Result<(), Error> {
        let mut stack = Vec::new();
        let mut open = Vec::new();
        let mut root = None;
        let mut buffer = Vec::new();
        let mut namespace_buffer = Vec::new();

        loop {
            let (namespace, event) =
                reader.read_namespaced_event(&mut buffer, &mut namespace_buffer)?;

            match event {
                Event::Start(start) => {
                    let name = reader.decode(start.local_name())?.to_owned();
                    root.get_or_insert_with(|| name.clone());
                    self.handle_start(&mut stack, &reader, start, namespace, url)?;
                    open.push(name);
                }

                Event::End(..) => {
                    self.handle_end(&mut stack)?;
                    open.pop();
                }

                Event::Empty(start) => {
                    let name = reader.decode(start.local_name())?.to_owned();
                    root.get_or_insert(name);
                    self.handle_start(&mut stack, &reader, start, namespace, url)?;
                    self.handle_end(&mut stack)?;
                }

                Event::Text(text) => self.handle_text(&mut stack, &reader, text)?,

                Event::Eof => break,

                event => trace!(?event, "ignoring event"),
            }

            buffer.clear();
        }

        if let Some(element) = open.pop() {
            return Err(Error::UnexpectedEof(element));
        }

        match root.as_deref() {
            Some("definitions") => Ok(()),
            Some("schema") if url.is_some() => Ok(()),
            _ => Err(Error::MissingDefinitions),
        }
    }

    fn handle_start<B: BufRead>(
        &mut self,
        stack: &mut Vec<ParseState>,
        reader: &Reader<B>,
        start: BytesStart<'_>,
        namespace_bytes: Option<&[u8]>,
        url: Option<&Url>,
    ) -> Result<(), Error> {
        let local_name = reader.decode(start.local_name())?;
        let namespace = namespace_bytes
            .map(|namespace| reader.decode(namespace))
            .transpose()?
            .unwrap_or_default();

        let state = stack.pop();
        let mut new_state = Some(ParseState::Other(local_name.to_owned()));

        self.current_namespaces.push_scope();

        for attribute in start.attributes() {
            let attribute = attribute?;
            let key = reader.decode(attribute.key)?;
            let value = attribute.unescaped_value()?;

            match split_namespaced_name(key) {
                (Some("xmlns"), prefix) => {
                    self.add_namespace_prefix(Some(prefix.to_owned()), reader.decode(value.as_ref())?)
                }
                (None, "xmlns") => self.add_namespace_prefix(None, reader.decode(value.as_ref())?),
                _ => (),
            }
        }

        match state {
            None => match local_name {
                "definitions" => {
                    let [namespace] =
                        get_attributes(reader, start.attributes(), ["targetNamespace"])?;
                    let namespace = namespace.unwrap_or_default();

                    self.definition
                        .target_namespace
                        .get_or_insert_with(|| namespace.clone());
                    self.push_target_namespace(namespace);

                    new_state = Some(ParseState::Definitions)
                }

                "schema" => {
                    let [namespace] =
                        get_attributes(reader, start.attributes(), ["targetNamespace"])?;

                    self.push_target_namespace(namespace.unwrap_or_default());
                    new_state = Some(ParseState::Schema)
                }

                _ => trace!(local_name, "unknown root element"),
            },

            Some(ParseState::Definitions) => match local_name {
                "import" => {
                    let [location] = get_attributes(reader, start.attributes(), ["location"])?;
                    let location = required(location, "import", "location")?;

                    self.parse_import(url, &location)?;
                    new_state = Some(ParseState::Import);
                }

                "types" => new_state = Some(ParseState::Types),

                "message" => {
                    let [name] = get_attributes(reader, start.attributes(), ["name"])?;

                    new_state = Some(ParseState::Message {
                        name: required(name, "message", "name")?,
                        parts: Vec::new(),
                    });
                }

                "portType" => {
                    let [name] = get_attributes(reader, start.attributes(), ["name"])?;

                    new_state = Some(ParseState::PortType {
                        name: required(name, "portType", "name")?,
                        operations: Vec::new(),
                    });
                }

                "binding" => {
                    let [name, ty] = get_attributes(reader, start.attributes(), ["name", "type"])?;

                    new_state = Some(ParseState::Binding {
                        name: required(name, "binding", "name")?,
                        ty: self.resolve_namespace(&required(ty, "binding", "type")?)?,
                        soap_version: None,
                        style: None,
                        transport: None,
                        operations: Vec::new(),
                    });
                }

                "service" => {
                    let [name] = get_attributes(reader, start.attributes(), ["name"])?;

                    new_state = Some(ParseState::Service {
                        name: required(name, "service", "name")?,
                        ports: Vec::new(),
                    });
                }

                _ => trace!(local_name, "skipping element inside definitions"),
            },

            Some(ParseState::Types) => match local_name {
                "schema" => {
                    let [namespace] =
                        get_attributes(reader, start.attributes(), ["targetNamespace"])?;
                    let namespace = namespace.unwrap_or_else(|| {
                        self.current_namespaces.target_namespace().to_owned()
                    });

                    self.push_target_namespace(namespace);
                    new_state = Some(ParseState::Schema)
                }

                _ => trace!(local_name, "skipping element inside types"),
            },

            Some(ParseState::Schema) => match local_name {
                "element" => {
                    let [name, ty] = get_attributes(reader, start.attributes(), ["name", "type"])?;

                    let kind = match ty {
                        Some(ty) => Some(TypeKind::Alias(self.resolve_namespace(&ty)?)),
                        None => None,
                    };

                    new_state = Some(ParseState::Element {
                        name: required(name, "element", "name")?,
                        kind,
                    })
                }

                "complexType" => {
                    let [name] = get_attributes(reader, start.attributes(), ["name"])?;

                    new_state = Some(ParseState::ComplexType {
                        kind: None,
                        name: Some(required(name, "complexType", "name")?),
                    });
                }

                "simpleType" => {
                    let [name] = get_attributes(reader, start.attributes(), ["name"])?;

                    new_state = Some(ParseState::SimpleType {
                        name: Some(required(name, "simpleType", "name")?),
                        ty: None,
                    })
                }

                "include" | "import" => {
                    let [location] =
                        get_attributes(reader, start.attributes(), ["schemaLocation"])?;

                    if let Some(location) = location {
                        self.parse_import(url, &location)?;
                    }

                    new_state = Some(ParseState::Import);
                }

                _ => trace!(local_name, "skipping element inside schema"),
            },

            Some(ParseState::Element { .. } | ParseState::SequenceElement { .. }) => {
                match local_name {
                    "complexType" => {
                        new_state = Some(ParseState::ComplexType {
                            kind: None,
                            name: None,
                        })
                    }

                    "simpleType" => new_state = Some(ParseState::SimpleType { name: None, ty: None }),

                    _ => trace!(local_name, "skipping element inside element"),
                }
            }

            Some(ParseState::ComplexType { .. } | ParseState::ComplexExtension { .. }) => {
                match local_name {
                    "sequence" | "all" | "choice" => new_state = Some(ParseState::Sequence(Vec::new())),

                    "simpleContent" if matches!(state, Some(ParseState::ComplexType { .. })) => {
                        new_state = Some(ParseState::SimpleContent { ty: None })
                    }

                    "complexContent" if matches!(state, Some(ParseState::ComplexType { .. })) => {
                        new_state = Some(ParseState::ComplexContent { kind: None })
                    }

                    _ => trace!(local_name, "skipping element inside complex type"),
                }
            }

            Some(ParseState::ComplexContent { .. }) => match local_name {
                "extension" | "restriction" => {
                    let [base] = get_attributes(reader, start.attributes(), ["base"])?;

                    new_state = Some(ParseState::ComplexExtension {
                        base: self.resolve_namespace(&required(base, "extension", "base")?)?,
                        fields: Vec::new(),
                    });
                }

                _ => trace!(local_name, "skipping element inside complex content"),
            },

            Some(ParseState::SimpleContent { .. }) => match local_name {
                "extension" | "restriction" => {
                    let [base] = get_attributes(reader, start.attributes(), ["base"])?;

                    new_state = Some(ParseState::SimpleExtension {
                        ty: self.resolve_namespace(&required(base, "extension", "base")?)?,
                    });
                }

                _ => trace!(local_name, "skipping element inside simple content"),
            },

            Some(ParseState::SimpleType { .. }) => match local_name {
                "restriction" => {
                    let [base] = get_attributes(reader, start.attributes(), ["base"])?;

                    new_state = Some(ParseState::Restriction {
                        ty: self.resolve_namespace(&required(base, "restriction", "base")?)?,
                    });
                }

                _ => trace!(local_name, "skipping element inside simple type"),
            },

            Some(ParseState::Sequence(_)) => match local_name {
                "element" => {
                    let [name, ty, reference] =
                        get_attributes(reader, start.attributes(), ["name", "type", "ref"])?;

                    new_state = Some(match (name, reference) {
                        (_, Some(reference)) => {
                            let element = self.resolve_namespace(&reference)?;
                            ParseState::SequenceElement {
                                name: element.name.clone(),
                                ty: Some(FieldKind::Element(element)),
                            }
                        }

                        (Some(name), None) => ParseState::SequenceElement {
                            name,
                            ty: match ty {
                                Some(ty) => Some(FieldKind::Type(self.resolve_namespace(&ty)?)),
                                None => None,
                            },
                        },

                        (None, None) => {
                            return Err(Error::MissingAttribute {
                                element: "element",
                                attribute: "name",
                            })
                        }
                    });
                }

                "sequence" | "all" | "choice" => new_state = Some(ParseState::Sequence(Vec::new())),

                _ => trace!(local_name, "skipping element inside sequence"),
            },

            Some(ParseState::Message { .. }) => match local_name {
                "part" => {
                    let [name, element, ty] =
                        get_attributes(reader, start.attributes(), ["name", "element", "type"])?;

                    let name = required(name, "part", "name")?;
                    let kind = match (element, ty) {
                        (Some(element), _) => PartKind::Element(self.resolve_reference(&element)?),
                        (None, Some(ty)) => PartKind::Type(self.resolve_reference(&ty)?),
                        (None, None) => {
                            return Err(Error::MissingAttribute {
                                element: "part",
                                attribute: "element",
                            })
                        }
                    };

                    new_state = Some(ParseState::Part(Part { name, kind }));
                }

                _ => trace!(local_name, "skipping element inside message"),
            },

            Some(ParseState::PortType { .. }) => match local_name {
                "operation" => {
                    let [name] = get_attributes(reader, start.attributes(), ["name"])?;

                    new_state = Some(ParseState::Operation {
                        name: required(name, "operation", "name")?,
                        documentation: None,
                        input: None,
                        output: None,
                    })
                }

                _ => trace!(local_name, "skipping element inside port type"),
            },

            Some(ParseState::Operation { .. }) => match local_name {
                "documentation" => new_state = Some(ParseState::Documentation(None)),

                "input" | "output" => {
                    let [message] = get_attributes(reader, start.attributes(), ["message"])?;
                    let message = self.resolve_namespace(&required(message, "input", "message")?)?;

                    if local_name == "input" {
                        new_state = Some(ParseState::Input { message })
                    } else {
                        new_state = Some(ParseState::Output { message })
                    }
                }

                _ => trace!(local_name, "skipping element inside operation"),
            },

            Some(ParseState::Binding { .. }) => match local_name {
                "binding" => {
                    let [transport, style] =
                        get_attributes(reader, start.attributes(), ["transport", "style"])?;

                    new_state = Some(ParseState::Transport {
                        soap_version: SoapVersion::from_binding_namespace(namespace),
                        style: style.as_deref().and_then(Style::parse),
                        transport,
                    })
                }

                "operation" => {
                    let [name] = get_attributes(reader, start.attributes(), ["name"])?;

                    new_state = Some(ParseState::BindingOperation {
                        name: required(name, "operation", "name")?,
                        action: None,
                        style: None,
                        input: None,
                        output: None,
                    })
                }

                _ => trace!(local_name, "skipping element inside binding"),
            },

            Some(ParseState::BindingOperation { .. }) => match local_name {
                "operation" => {
                    let [action, style] =
                        get_attributes(reader, start.attributes(), ["soapAction", "style"])?;

                    new_state = Some(ParseState::OperationAction {
                        action,
                        style: style.as_deref().and_then(Style::parse),
                    });
                }

                "input" => new_state = Some(ParseState::BindingInput { body: None }),
                "output" => new_state = Some(ParseState::BindingOutput { body: None }),

                _ => trace!(local_name, "skipping element inside binding operation"),
            },

            Some(ParseState::BindingInput { .. } | ParseState::BindingOutput { .. }) => {
                match local_name {
                    "body" => {
                        let [body] = get_attributes(reader, start.attributes(), ["use"])?;
                        new_state = Some(ParseState::BindingBody { body });
                    }

                    _ => trace!(local_name, "skipping element inside binding message"),
                }
            }

            Some(ParseState::Service { .. }) => match local_name {
                "port" => {
                    let [name, binding] =
                        get_attributes(reader, start.attributes(), ["name", "binding"])?;

                    new_state = Some(ParseState::Port {
                        name: required(name, "port", "name")?,
                        binding: self.resolve_namespace(&required(binding, "port", "binding")?)?,
                        address: None,
                    });
                }

                _ => trace!(local_name, "skipping element inside service"),
            },

            Some(ParseState::Port { .. }) => match local_name {
                "address" => {
                    let [location] = get_attributes(reader, start.attributes(), ["location"])?;

                    new_state = Some(ParseState::Address {
                        location: required(location, "address", "location")?,
                    })
                }

                _ => trace!(local_name, "skipping element inside port"),
            },

            Some(ref other) => trace!(local_name, parent = ?other, "skipping nested element"),
        }

        stack.extend(state);
        stack.extend(new_state);

        Ok(())
    }

    fn handle_end(&mut self, stack: &mut Vec<ParseState>) -> Result<(), Error> {
        let finished_state = stack.pop();
        let mut next_state = stack.pop();

        match finished_state {
            Some(ParseState::Definitions | ParseState::Schema) => self.pop_target_namespace(),

            Some(ParseState::Element { name, kind }) => {
                let name = self.target_namespaced(name);
                let kind = kind.unwrap_or(TypeKind::Struct(Vec::new()));
                self.definition.elements.push(Type { name, kind })
            }

            Some(ParseState::ComplexType { kind, name }) => {
                let kind = kind.unwrap_or(TypeKind::Struct(Vec::new()));

                match next_state {
                    Some(ParseState::SequenceElement { ref mut ty, .. }) => {
                        *ty = Some(FieldKind::Inner(kind))
                    }

                    Some(ParseState::Element {
                        kind: ref mut element_kind,
                        ..
                    }) => *element_kind = Some(kind),

                    _ => {
                        let name = self.target_namespaced(required(name, "complexType", "name")?);
                        self.definition.types.push(Type { name, kind })
                    }
                }
            }

            Some(ParseState::ComplexContent { kind: content }) => match next_state {
                Some(ParseState::ComplexType { ref mut kind, .. }) => *kind = content,
                _ => return Err(misplaced("complexContent")),
            },

            Some(ParseState::ComplexExtension { base, fields }) => match next_state {
                Some(ParseState::ComplexContent { ref mut kind }) => {
                    *kind = Some(TypeKind::Extension { base, fields })
                }
                _ => return Err(misplaced("extension")),
            },

            Some(ParseState::SimpleContent { ty }) => match next_state {
                Some(ParseState::ComplexType { ref mut kind, .. }) => {
                    *kind = ty.map(TypeKind::Alias)
                }
                _ => return Err(misplaced("simpleContent")),
            },

            Some(ParseState::SimpleExtension { ty: base }) => match next_state {
                Some(ParseState::SimpleContent { ref mut ty }) => *ty = Some(base),
                _ => return Err(misplaced("extension")),
            },

            Some(ParseState::SimpleType { name, ty }) => {
                let kind = TypeKind::Simple(ty.unwrap_or_else(|| QName::new(XSD_NAMESPACE, "string")));

                match next_state {
                    Some(ParseState::SequenceElement { ty: ref mut field, .. }) => {
                        *field = Some(FieldKind::Inner(kind))
                    }

                    Some(ParseState::Element {
                        kind: ref mut element_kind,
                        ..
                    }) => *element_kind = Some(kind),

                    _ => {
                        let name = self.target_namespaced(required(name, "simpleType", "name")?);
                        self.definition.types.push(Type { name, kind })
                    }
                }
            }

            Some(ParseState::Restriction { ty: base }) => match next_state {
                Some(ParseState::SimpleType { ref mut ty, .. }) => *ty = Some(base),
                _ => return Err(misplaced("restriction")),
            },

            Some(ParseState::Sequence(fields)) => match next_state {
                Some(ParseState::ComplexType { ref mut kind, .. }) => match kind {
                    Some(TypeKind::Struct(existing)) => existing.extend(fields),
                    _ => *kind = Some(TypeKind::Struct(fields)),
                },

                Some(
                    ParseState::ComplexExtension {
                        fields: ref mut existing,
                        ..
                    }
                    | ParseState::Sequence(ref mut existing),
                ) => existing.extend(fields),

                _ => return Err(misplaced("sequence")),
            },

            Some(ParseState::SequenceElement { name, ty }) => match next_state {
                Some(ParseState::Sequence(ref mut fields)) => fields.push(Field {
                    name,
                    ty: ty.unwrap_or(FieldKind::Inner(TypeKind::Struct(Vec::new()))),
                }),
                _ => return Err(misplaced("element")),
            },

            Some(ParseState::Message { name, parts }) => {
                let name = self.target_namespaced(name);
                self.definition.messages.push(Message { name, parts })
            }

            Some(ParseState::Part(part)) => match next_state {
                Some(ParseState::Message { ref mut parts, .. }) => parts.push(part),
                _ => return Err(misplaced("part")),
            },

            Some(ParseState::PortType { name, operations }) => {
                let name = self.target_namespaced(name);
                self.definition
                    .port_types
                    .push(PortType { name, operations })
            }

            Some(ParseState::Operation {
                name,
                input,
                output,
                documentation,
            }) => match next_state {
                Some(ParseState::PortType {
                    ref mut operations, ..
                }) => operations.push(Operation {
                    name,
                    input,
                    output,
                    documentation,
                }),
                _ => return Err(misplaced("operation")),
            },

            Some(ParseState::Documentation(text)) => match next_state {
                Some(ParseState::Operation {
                    ref mut documentation,
                    ..
                }) => *documentation = text,
                _ => return Err(misplaced("documentation")),
            },

            Some(ParseState::Input { message }) => match next_state {
                Some(ParseState::Operation { ref mut input, .. }) => *input = Some(message),
                _ => return Err(misplaced("input")),
            },

            Some(ParseState::Output { message }) => match next_state {
                Some(ParseState::Operation { ref mut output, .. }) => *output = Some(message),
                _ => return Err(misplaced("output")),
            },

            Some(ParseState::Transport {
                soap_version: version,
                style: binding_style,
                transport: kind,
            }) => match next_state {
                Some(ParseState::Binding {
                    ref mut soap_version,
                    ref mut style,
                    ref mut transport,
                    ..
                }) => {
                    *soap_version = soap_version.or(version);
                    *style = style.or(binding_style);
                    *transport = transport.take().or(kind);
                }
                _ => return Err(misplaced("binding")),
            },

            Some(ParseState::Binding {
                name,
                ty,
                soap_version,
                style,
                transport,
                operations,
            }) => {
                let name = self.target_namespaced(name);
                self.definition.bindings.push(Binding {
                    name,
                    ty,
                    soap_version,
                    style: style.unwrap_or(Style::Document),
                    transport,
                    operations,
                })
            }

            Some(ParseState::BindingOperation {
                name,
                action,
                style,
                input,
                output,
            }) => match next_state {
                Some(ParseState::Binding {
                    ref mut operations, ..
                }) => operations.push(BindingOperation {
                    name,
                    action: action.unwrap_or_default(),
                    style,
                    input,
                    output,
                }),
                _ => return Err(misplaced("operation")),
            },

            Some(ParseState::OperationAction { action, style }) => match next_state {
                Some(ParseState::BindingOperation {
                    action: ref mut a,
                    style: ref mut s,
                    ..
                }) => {
                    *a = a.take().or(action);
                    *s = s.or(style);
                }
                _ => return Err(misplaced("operation")),
            },

            Some(ParseState::BindingInput { body }) => match next_state {
                Some(ParseState::BindingOperation { ref mut input, .. }) => *input = body,
                _ => return Err(misplaced("input")),
            },

            Some(ParseState::BindingOutput { body }) => match next_state {
                Some(ParseState::BindingOperation { ref mut output, .. }) => *output = body,
                _ => return Err(misplaced("output")),
            },

            Some(ParseState::BindingBody { body: body_use }) => match next_state {
                Some(
                    ParseState::BindingInput { ref mut body }
                    | ParseState::BindingOutput { ref mut body },
                ) => *body = body_use,
                _ => return Err(misplaced("body")),
            },

            Some(ParseState::Service { name, ports }) => {
                let namespace = self.current_namespaces.target_namespace().to_owned();
                self.definition.services.push(Service {
                    name,
                    namespace,
                    ports,
                })
            }

            Some(ParseState::Port {
                name,
                binding,
                address,
            }) => match next_state {
                Some(ParseState::Service { ref mut ports, .. }) => ports.push(Port {
                    name,
                    binding,
                    location: address,
                }),
                _ => return Err(misplaced("port")),
            },

            Some(ParseState::Address { location }) => match next_state {
                Some(ParseState::Port {
                    ref mut address, ..
                }) => *address = Some(location),
                _ => return Err(misplaced("address")),
            },

            _ => (),
        }

        self.current_namespaces.pop_scope();
        stack.extend(next_state);
        Ok(())
    }

    fn handle_text<B: BufRead>(
        &mut self,
        stack: &mut Vec<ParseState>,
        reader: &Reader<B>,
        text: BytesText<'_>,
    ) -> Result<(), Error> {
        if let Some(ParseState::Documentation(ref mut docs)) = stack.last_mut() {
            let unescaped = text.unescaped()?;
            let text = reader.decode(unescaped.as_ref())?.trim();

            if !text.is_empty() {
                *docs = Some(text.to_owned());
            }
        }

        Ok(())
    }
}

/// Parses a WSDL document held in memory. Imports are skipped since there is no base
/// location to resolve them against.
pub fn parse_str(xml: &str) -> Result<Definition, Error> {
    let mut parser = Parser::new();
    parser.parse_xml(None, Reader::from_str(xml))?;
    Ok(parser.definition)
}

/// Fetches and parses the WSDL document at `url`, following its imports.
pub fn parse_url(url: Url) -> Result<Definition, Error> {
    let mut parser = Parser::new();
    parser.parse_url(url)?;
    Ok(parser.definition)
}
