use lather_util::{Map, SoapVersion, Value};
use tracing::debug;

use super::{
    error::{Component, Error},
    parser::{self, XSD_NAMESPACE},
    types::{
        Binding, BindingOperation, Definition, Field, FieldKind, Message, Operation, Part,
        PartKind, Port, QName, Service, Style, TypeKind,
    },
};

/// Nesting limit when expanding schema types into example bodies. Stops recursive types.
const MAX_EXAMPLE_DEPTH: usize = 16;

/// A parsed and cross-checked WSDL document.
///
/// Every port, binding, port type and message reference is checked when the document is
/// built, so lookups only fail on names the caller supplies.
#[derive(Debug, Clone)]
pub struct WsdlDocument {
    definition: Definition,
}

/// A SOAP port as listed by [`WsdlDocument::services`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortInfo<'a> {
    pub service: &'a str,
    pub port: &'a str,
    pub endpoint: Option<&'a str>,
    pub soap_version: SoapVersion,
}

/// Read-only view of one operation as reached through a service and port.
#[derive(Debug, Clone, Copy)]
pub struct OperationDescriptor<'a> {
    definition: &'a Definition,
    service: &'a Service,
    port: &'a Port,
    binding: &'a Binding,
    binding_operation: &'a BindingOperation,
    operation: &'a Operation,
    soap_version: SoapVersion,
}

fn dangling(kind: &'static str, name: &QName) -> Error {
    Error::DanglingReference {
        kind,
        name: name.to_string(),
    }
}

fn not_found(component: Component, name: &str) -> Error {
    Error::NotFound {
        component,
        name: name.to_owned(),
    }
}

impl WsdlDocument {
    /// Parses a WSDL document held in memory.
    pub fn parse(xml: &str) -> Result<Self, Error> {
        Self::from_definition(parser::parse_str(xml)?)
    }

    pub fn from_definition(definition: Definition) -> Result<Self, Error> {
        check_references(&definition)?;
        Ok(Self { definition })
    }

    pub fn definition(&self) -> &Definition {
        &self.definition
    }

    pub fn target_namespace(&self) -> Option<&str> {
        self.definition.target_namespace.as_deref()
    }

    /// Lists every port bound through a SOAP 1.1 or 1.2 binding, in document order.
    pub fn services(&self) -> Vec<PortInfo<'_>> {
        self.definition
            .services
            .iter()
            .flat_map(|service| {
                service.ports.iter().filter_map(move |port| {
                    let binding = self.soap_binding(port)?;

                    Some(PortInfo {
                        service: &service.name,
                        port: &port.name,
                        endpoint: port.location.as_deref(),
                        soap_version: binding.soap_version?,
                    })
                })
            })
            .collect()
    }

    /// Names of the operations available on a SOAP port.
    pub fn operations(&self, service: &str, port: &str) -> Result<Vec<&str>, Error> {
        let (_, _, binding) = self.find_port(service, port)?;

        Ok(binding
            .operations
            .iter()
            .map(|operation| operation.name.as_str())
            .collect())
    }

    pub fn operation(
        &self,
        service: &str,
        port: &str,
        operation: &str,
    ) -> Result<OperationDescriptor<'_>, Error> {
        let (service, port, binding) = self.find_port(service, port)?;

        let binding_operation = binding
            .operations
            .iter()
            .find(|candidate| candidate.name == operation)
            .ok_or_else(|| not_found(Component::Operation, operation))?;

        let port_type = self
            .definition
            .find_port_type(&binding.ty)
            .ok_or_else(|| dangling("portType", &binding.ty))?;

        let abstract_operation = port_type
            .operations
            .iter()
            .find(|candidate| candidate.name == operation)
            .ok_or_else(|| dangling("operation", &QName::new(&port_type.name.namespace, operation)))?;

        let soap_version = binding
            .soap_version
            .ok_or_else(|| not_found(Component::Port, &port.name))?;

        let descriptor = OperationDescriptor {
            definition: &self.definition,
            service,
            port,
            binding,
            binding_operation,
            operation: abstract_operation,
            soap_version,
        };

        debug!(
            service = descriptor.service_name(),
            port = descriptor.port_name(),
            operation = descriptor.name(),
            version = %soap_version,
            action = descriptor.soap_action(),
            "resolved operation"
        );

        Ok(descriptor)
    }

    fn find_port(&self, service: &str, port: &str) -> Result<(&Service, &Port, &Binding), Error> {
        let service = self
            .definition
            .services
            .iter()
            .find(|candidate| candidate.name == service)
            .ok_or_else(|| not_found(Component::Service, service))?;

        let port = service
            .ports
            .iter()
            .find(|candidate| candidate.name == port)
            .ok_or_else(|| not_found(Component::Port, port))?;

        match self.soap_binding(port) {
            Some(binding) => Ok((service, port, binding)),
            None => {
                debug!(port = %port.name, "port does not use a SOAP binding");
                Err(not_found(Component::Port, &port.name))
            }
        }
    }

    fn soap_binding(&self, port: &Port) -> Option<&Binding> {
        self.definition
            .find_binding(&port.binding)
            .filter(|binding| binding.soap_version.is_some())
    }
}

fn check_references(definition: &Definition) -> Result<(), Error> {
    for service in &definition.services {
        for port in &service.ports {
            definition
                .find_binding(&port.binding)
                .ok_or_else(|| dangling("binding", &port.binding))?;
        }
    }

    for binding in &definition.bindings {
        let port_type = definition
            .find_port_type(&binding.ty)
            .ok_or_else(|| dangling("portType", &binding.ty))?;

        for operation in &binding.operations {
            if !port_type
                .operations
                .iter()
                .any(|candidate| candidate.name == operation.name)
            {
                return Err(dangling(
                    "operation",
                    &QName::new(&port_type.name.namespace, &operation.name),
                ));
            }
        }
    }

    for port_type in &definition.port_types {
        for operation in &port_type.operations {
            for message in operation.input.iter().chain(&operation.output) {
                definition
                    .find_message(message)
                    .ok_or_else(|| dangling("message", message))?;
            }
        }
    }

    Ok(())
}

impl<'a> OperationDescriptor<'a> {
    pub fn name(&self) -> &'a str {
        &self.operation.name
    }

    pub fn service_name(&self) -> &'a str {
        &self.service.name
    }

    pub fn port_name(&self) -> &'a str {
        &self.port.name
    }

    /// The port's address location.
    pub fn endpoint(&self) -> Option<&'a str> {
        self.port.location.as_deref()
    }

    pub fn soap_version(&self) -> SoapVersion {
        self.soap_version
    }

    /// The `soapAction` of the binding operation, empty when the binding declares none.
    pub fn soap_action(&self) -> &'a str {
        &self.binding_operation.action
    }

    /// Operation style, falling back to the binding's style.
    pub fn style(&self) -> Style {
        self.binding_operation.style.unwrap_or(self.binding.style)
    }

    pub fn documentation(&self) -> Option<&'a str> {
        self.operation.documentation.as_deref()
    }

    /// Namespace of the request wrapper: the namespace of the first element part, or the
    /// namespace the service was declared in.
    pub fn target_namespace(&self) -> &'a str {
        self.input_parts()
            .iter()
            .find_map(|part| match &part.kind {
                PartKind::Element(reference) => Some(reference.resolved.namespace.as_str()),
                PartKind::Type(_) => None,
            })
            .unwrap_or(&self.service.namespace)
    }

    pub fn input_message(&self) -> Option<&'a Message> {
        self.operation
            .input
            .as_ref()
            .and_then(|name| self.definition.find_message(name))
    }

    pub fn output_message(&self) -> Option<&'a Message> {
        self.operation
            .output
            .as_ref()
            .and_then(|name| self.definition.find_message(name))
    }

    pub fn input_parts(&self) -> &'a [Part] {
        self.input_message()
            .map(|message| message.parts.as_slice())
            .unwrap_or_default()
    }

    pub fn output_parts(&self) -> &'a [Part] {
        self.output_message()
            .map(|message| message.parts.as_slice())
            .unwrap_or_default()
    }

    /// Part names paired with their type or element reference as written in the document.
    pub fn parts(&self) -> Vec<(&'a str, &'a str)> {
        self.input_parts()
            .iter()
            .map(|part| (part.name.as_str(), part.declared_type()))
            .collect()
    }

    /// A request scaffold keyed by the wrapper element name.
    ///
    /// Element parts expand into the schema element's fields; type parts are grouped under
    /// the operation name. Leaves hold the local XSD type name (`"string"`, `"double"`).
    pub fn example_body(&self) -> Value {
        let mut body = Map::new();
        let mut typed = Map::new();

        for part in self.input_parts() {
            match &part.kind {
                PartKind::Element(reference) => {
                    body.insert(
                        reference.resolved.name.clone(),
                        self.example_element(&reference.resolved, 0),
                    );
                }

                PartKind::Type(reference) => {
                    typed.insert(part.name.clone(), self.example_type(&reference.resolved, 0));
                }
            }
        }

        if !typed.is_empty() {
            body.insert(self.name().to_owned(), Value::Map(typed));
        }

        Value::Map(body)
    }

    fn example_element(&self, name: &QName, depth: usize) -> Value {
        match self.definition.find_element(name) {
            Some(element) if depth < MAX_EXAMPLE_DEPTH => self.example_kind(&element.kind, depth + 1),
            _ => Value::Text(name.name.clone()),
        }
    }

    fn example_type(&self, name: &QName, depth: usize) -> Value {
        if name.namespace == XSD_NAMESPACE || depth >= MAX_EXAMPLE_DEPTH {
            return Value::Text(name.name.clone());
        }

        match self.definition.find_type(name) {
            Some(ty) => self.example_kind(&ty.kind, depth + 1),
            None => Value::Text(name.name.clone()),
        }
    }

    fn example_kind(&self, kind: &TypeKind, depth: usize) -> Value {
        match kind {
            TypeKind::Struct(fields) => Value::Map(self.example_fields(fields, depth)),

            TypeKind::Extension { base, fields } => {
                let mut map = match self.example_type(base, depth) {
                    Value::Map(map) => map,
                    _ => Map::new(),
                };

                map.extend(self.example_fields(fields, depth));
                Value::Map(map)
            }

            TypeKind::Simple(base) | TypeKind::Alias(base) => self.example_type(base, depth),
        }
    }

    fn example_fields(&self, fields: &[Field], depth: usize) -> Map {
        fields
            .iter()
            .map(|field| {
                let value = match &field.ty {
                    FieldKind::Type(name) => self.example_type(name, depth),
                    FieldKind::Element(name) => self.example_element(name, depth),
                    FieldKind::Inner(kind) => self.example_kind(kind, depth),
                };

                (field.name.clone(), value)
            })
            .collect()
    }
}
