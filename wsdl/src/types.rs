use lather_util::SoapVersion;
use std::fmt;

/// A name qualified by the namespace URI its prefix resolved to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QName {
    pub namespace: String,
    pub name: String,
}

/// A reference as written in the document alongside its resolved form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub declared: String,
    pub resolved: QName,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    Document,
    Rpc,
}

#[derive(Debug, Clone)]
pub enum TypeKind {
    Struct(Vec<Field>),
    Extension { base: QName, fields: Vec<Field> },
    Simple(QName),
    Alias(QName),
}

#[derive(Debug, Clone)]
pub struct Type {
    pub name: QName,
    pub kind: TypeKind,
}

#[derive(Debug, Clone)]
pub enum FieldKind {
    Type(QName),
    Element(QName),
    Inner(TypeKind),
}

#[derive(Debug, Clone)]
pub struct Field {
    pub name: String,
    pub ty: FieldKind,
}

#[derive(Debug, Clone)]
pub enum PartKind {
    Element(Reference),
    Type(Reference),
}

#[derive(Debug, Clone)]
pub struct Part {
    pub name: String,
    pub kind: PartKind,
}

#[derive(Debug, Clone)]
pub struct Message {
    pub name: QName,
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone)]
pub struct Operation {
    pub name: String,
    pub documentation: Option<String>,
    pub input: Option<QName>,
    pub output: Option<QName>,
}

#[derive(Debug, Clone)]
pub struct PortType {
    pub name: QName,
    pub operations: Vec<Operation>,
}

#[derive(Debug, Clone)]
pub struct BindingOperation {
    pub name: String,
    pub action: String,
    pub style: Option<Style>,
    pub input: Option<String>,
    pub output: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Binding {
    pub name: QName,
    pub ty: QName,
    pub soap_version: Option<SoapVersion>,
    pub style: Style,
    pub transport: Option<String>,
    pub operations: Vec<BindingOperation>,
}

#[derive(Debug, Clone)]
pub struct Port {
    pub name: String,
    pub binding: QName,
    pub location: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Service {
    pub name: String,
    pub namespace: String,
    pub ports: Vec<Port>,
}

/// Everything collected from a WSDL document and the documents it imports.
#[derive(Default, Debug, Clone)]
pub struct Definition {
    pub target_namespace: Option<String>,
    pub types: Vec<Type>,
    pub elements: Vec<Type>,
    pub messages: Vec<Message>,
    pub port_types: Vec<PortType>,
    pub bindings: Vec<Binding>,
    pub services: Vec<Service>,
}

impl QName {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}{}", self.namespace, self.name)
    }
}

impl Style {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "document" => Some(Self::Document),
            "rpc" => Some(Self::Rpc),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Document => "document",
            Self::Rpc => "rpc",
        }
    }
}

impl Part {
    /// The element or type reference exactly as it appears in the document.
    pub fn declared_type(&self) -> &str {
        match &self.kind {
            PartKind::Element(reference) | PartKind::Type(reference) => &reference.declared,
        }
    }
}

fn find_named<'a, T>(items: &'a [T], name: &QName, key: impl Fn(&T) -> &QName) -> Option<&'a T> {
    items.iter().find(|item| key(*item) == name)
}

impl Definition {
    pub fn find_type(&self, name: &QName) -> Option<&Type> {
        find_named(&self.types, name, |ty| &ty.name)
    }

    pub fn find_element(&self, name: &QName) -> Option<&Type> {
        find_named(&self.elements, name, |element| &element.name)
    }

    pub fn find_message(&self, name: &QName) -> Option<&Message> {
        find_named(&self.messages, name, |message| &message.name)
    }

    pub fn find_port_type(&self, name: &QName) -> Option<&PortType> {
        find_named(&self.port_types, name, |port_type| &port_type.name)
    }

    pub fn find_binding(&self, name: &QName) -> Option<&Binding> {
        find_named(&self.bindings, name, |binding| &binding.name)
    }
}
