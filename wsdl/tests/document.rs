use lather_util::{SoapVersion, Value};
use lather_wsdl::{types::Style, Component, Error, PortInfo, WsdlDocument};
use rstest::rstest;

const TEMPERATURE: &str = include_str!("../../tests/fixtures/temperature.wsdl");
const STOCK_QUOTE: &str = include_str!("../../tests/fixtures/stock_quote.wsdl");

fn temperature() -> WsdlDocument {
    lather_wsdl::parse(TEMPERATURE).expect("temperature fixture parses")
}

#[rstest]
#[case("ConvertTemperatureSoap", SoapVersion::Soap11)]
#[case("ConvertTemperatureSoap12", SoapVersion::Soap12)]
fn version_follows_binding_namespace(#[case] port: &str, #[case] version: SoapVersion) {
    let document = temperature();
    let operation = document
        .operation("ConvertTemperature", port, "ConvertTemp")
        .unwrap();

    assert_eq!(operation.soap_version(), version);
}

#[test]
fn descriptor_exposes_binding_details() {
    let document = temperature();
    let operation = document
        .operation("ConvertTemperature", "ConvertTemperatureSoap12", "ConvertTemp")
        .unwrap();

    assert_eq!(operation.name(), "ConvertTemp");
    assert_eq!(operation.service_name(), "ConvertTemperature");
    assert_eq!(operation.port_name(), "ConvertTemperatureSoap12");
    assert_eq!(
        operation.endpoint(),
        Some("http://www.webservicex.net/ConvertTemperature.asmx")
    );
    assert_eq!(operation.soap_action(), "http://www.webserviceX.NET/ConvertTemp");
    assert_eq!(operation.style(), Style::Document);
    assert_eq!(operation.target_namespace(), "http://www.webserviceX.NET/");
    assert_eq!(
        operation.documentation(),
        Some("Converts a temperature between units.")
    );
    assert_eq!(operation.parts(), vec![("parameters", "tns:ConvertTemp")]);
    assert_eq!(operation.output_parts().len(), 1);
}

#[test]
fn example_body_expands_schema_element() {
    let document = temperature();
    let operation = document
        .operation("ConvertTemperature", "ConvertTemperatureSoap12", "ConvertTemp")
        .unwrap();

    let expected = Value::map([(
        "ConvertTemp",
        Value::map([
            ("Temperature", "double"),
            ("FromUnit", "string"),
            ("ToUnit", "string"),
        ]),
    )]);

    let body = operation.example_body();
    assert_eq!(body, expected);

    let fields: Vec<_> = body
        .get("ConvertTemp")
        .and_then(Value::as_map)
        .unwrap()
        .keys()
        .cloned()
        .collect();
    assert_eq!(fields, ["Temperature", "FromUnit", "ToUnit"]);
}

#[test]
fn lists_soap_ports_only() {
    let document = temperature();

    assert_eq!(
        document.services(),
        vec![
            PortInfo {
                service: "ConvertTemperature",
                port: "ConvertTemperatureSoap",
                endpoint: Some("http://www.webservicex.net/ConvertTemperature.asmx"),
                soap_version: SoapVersion::Soap11,
            },
            PortInfo {
                service: "ConvertTemperature",
                port: "ConvertTemperatureSoap12",
                endpoint: Some("http://www.webservicex.net/ConvertTemperature.asmx"),
                soap_version: SoapVersion::Soap12,
            },
        ]
    );
    assert_eq!(
        document
            .operations("ConvertTemperature", "ConvertTemperatureSoap")
            .unwrap(),
        vec!["ConvertTemp"]
    );
}

#[rstest]
#[case("Nope", "ConvertTemperatureSoap12", "ConvertTemp", Component::Service, "Nope")]
#[case("ConvertTemperature", "Nope", "ConvertTemp", Component::Port, "Nope")]
#[case("ConvertTemperature", "ConvertTemperatureSoap12", "Nope", Component::Operation, "Nope")]
#[case(
    "ConvertTemperature",
    "ConvertTemperatureHttpGet",
    "ConvertTemp",
    Component::Port,
    "ConvertTemperatureHttpGet"
)]
fn lookup_misses_name_the_component(
    #[case] service: &str,
    #[case] port: &str,
    #[case] operation: &str,
    #[case] expected_component: Component,
    #[case] expected_name: &str,
) {
    let document = temperature();

    match document.operation(service, port, operation) {
        Err(Error::NotFound { component, name }) => {
            assert_eq!(component, expected_component);
            assert_eq!(name, expected_name);
        }
        other => panic!("expected NotFound, got {:?}", other.map(|op| op.name())),
    }
}

#[test]
fn rpc_binding_groups_type_parts_under_operation() {
    let document = lather_wsdl::parse(STOCK_QUOTE).unwrap();
    let operation = document
        .operation("StockQuoteService", "StockQuotePort", "GetLastTradePrice")
        .unwrap();

    assert_eq!(operation.soap_version(), SoapVersion::Soap11);
    assert_eq!(operation.style(), Style::Rpc);
    assert_eq!(operation.soap_action(), "http://example.com/GetLastTradePrice");
    assert_eq!(operation.target_namespace(), "http://example.com/stockquote.wsdl");
    assert_eq!(
        operation.parts(),
        vec![
            ("tickerSymbol", "xsd:string"),
            ("currency", "xsd:string"),
            ("days", "xsd:int"),
        ]
    );
    assert_eq!(
        operation.example_body(),
        Value::map([(
            "GetLastTradePrice",
            Value::map([
                ("tickerSymbol", "string"),
                ("currency", "string"),
                ("days", "int"),
            ]),
        )])
    );
}

#[test]
fn missing_soap_action_is_empty() {
    let document = lather_wsdl::parse(STOCK_QUOTE).unwrap();
    let operation = document
        .operation("StockQuoteService", "StockQuotePort", "Ping")
        .unwrap();

    assert_eq!(operation.soap_action(), "");
    assert_eq!(operation.style(), Style::Document);
}

#[test]
fn malformed_xml_is_a_parse_error() {
    let result = lather_wsdl::parse(r#"<definitions><message name="a"></definitions>"#);
    assert!(matches!(result, Err(Error::XmlParseError(_))));
}

#[test]
fn truncated_document_is_a_parse_error() {
    let result = lather_wsdl::parse(r#"<definitions targetNamespace="urn:x"><message name="a">"#);
    assert!(matches!(result, Err(Error::UnexpectedEof(element)) if element == "message"));
}

#[test]
fn non_wsdl_document_is_rejected() {
    assert!(matches!(
        lather_wsdl::parse("<html><body/></html>"),
        Err(Error::MissingDefinitions)
    ));
    assert!(matches!(
        lather_wsdl::parse("not xml at all"),
        Err(Error::MissingDefinitions)
    ));
}

fn dangling_kind(xml: &str) -> (&'static str, String) {
    match lather_wsdl::parse(xml) {
        Err(Error::DanglingReference { kind, name }) => (kind, name),
        Err(other) => panic!("expected dangling reference, got {}", other),
        Ok(_) => panic!("expected dangling reference, document parsed"),
    }
}

#[test]
fn dangling_binding_reference() {
    let xml = TEMPERATURE.replace(
        r#"binding="tns:ConvertTemperatureSoap12""#,
        r#"binding="tns:Missing""#,
    );

    assert_eq!(
        dangling_kind(&xml),
        ("binding", "{http://www.webserviceX.NET/}Missing".to_owned())
    );
}

#[test]
fn dangling_port_type_reference() {
    let xml = TEMPERATURE.replace(
        r#"type="tns:ConvertTemperatureHttpGet""#,
        r#"type="tns:MissingPortType""#,
    );

    assert_eq!(
        dangling_kind(&xml),
        ("portType", "{http://www.webserviceX.NET/}MissingPortType".to_owned())
    );
}

#[test]
fn dangling_message_reference() {
    let xml = TEMPERATURE.replace(
        r#"message="tns:ConvertTempSoapIn""#,
        r#"message="tns:MissingMessage""#,
    );

    assert_eq!(
        dangling_kind(&xml),
        ("message", "{http://www.webserviceX.NET/}MissingMessage".to_owned())
    );
}

#[test]
fn undeclared_prefix_is_reported() {
    let xml = TEMPERATURE.replace(r#"type="tns:TemperatureUnit""#, r#"type="nope:TemperatureUnit""#);

    assert!(matches!(
        lather_wsdl::parse(xml),
        Err(Error::UnknownPrefix(prefix)) if prefix == "nope"
    ));
}

#[test]
fn document_is_shareable_across_threads() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<WsdlDocument>();
}

const SCOPED_PREFIXES: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<wsdl:definitions xmlns:wsdl="http://schemas.xmlsoap.org/wsdl/"
    xmlns:soap="http://schemas.xmlsoap.org/wsdl/soap/"
    xmlns:xs="http://www.w3.org/2001/XMLSchema"
    xmlns:tns="urn:svc"
    targetNamespace="urn:svc">
  <wsdl:types>
    <xs:schema targetNamespace="urn:svc" xmlns:tns="urn:svc">
      <xs:element name="GetData">
        <xs:complexType>
          <xs:sequence>
            <xs:element name="value" type="xs:int"/>
          </xs:sequence>
        </xs:complexType>
      </xs:element>
    </xs:schema>
    <xs:schema targetNamespace="urn:ser" xmlns:tns="urn:ser">
      <xs:element name="GetData" type="tns:Serialized"/>
      <xs:simpleType name="Serialized">
        <xs:restriction base="xs:string"/>
      </xs:simpleType>
    </xs:schema>
  </wsdl:types>
  <wsdl:message name="GetDataIn">
    <wsdl:part name="parameters" element="tns:GetData"/>
  </wsdl:message>
  <wsdl:portType name="Port">
    <wsdl:operation name="GetData">
      <wsdl:input message="tns:GetDataIn"/>
    </wsdl:operation>
  </wsdl:portType>
  <wsdl:binding name="Binding" type="tns:Port">
    <soap:binding transport="http://schemas.xmlsoap.org/soap/http"/>
    <wsdl:operation name="GetData">
      <soap:operation soapAction="urn:svc/GetData"/>
    </wsdl:operation>
  </wsdl:binding>
  <wsdl:service name="S">
    <wsdl:port name="P" binding="tns:Binding">
      <soap:address location="http://example.com/svc"/>
    </wsdl:port>
  </wsdl:service>
</wsdl:definitions>
"#;

#[test]
fn prefixes_are_scoped_to_their_element() {
    let document = lather_wsdl::parse(SCOPED_PREFIXES).unwrap();
    let operation = document.operation("S", "P", "GetData").unwrap();

    assert_eq!(operation.target_namespace(), "urn:svc");
    assert_eq!(
        operation.example_body(),
        Value::map([("GetData", Value::map([("value", "int")]))])
    );
}

#[test]
fn reference_into_foreign_namespace_is_dangling() {
    let xml = TEMPERATURE.replace(
        r#"binding="tns:ConvertTemperatureSoap12""#,
        r#"binding="s:ConvertTemperatureSoap12""#,
    );

    assert_eq!(
        dangling_kind(&xml),
        (
            "binding",
            "{http://www.w3.org/2001/XMLSchema}ConvertTemperatureSoap12".to_owned()
        )
    );
}

#[test]
fn undeclared_tns_prefix_is_reported() {
    let xml = SCOPED_PREFIXES.replace(r#"    xmlns:tns="urn:svc"
    targetNamespace"#, "    targetNamespace");

    assert!(matches!(
        lather_wsdl::parse(xml),
        Err(Error::UnknownPrefix(prefix)) if prefix == "tns"
    ));
}

#[test]
fn unprefixed_references_under_wsdl_default_namespace() {
    let xml = STOCK_QUOTE
        .replace(r#"binding="tns:StockQuoteSoapBinding""#, r#"binding="StockQuoteSoapBinding""#)
        .replace(r#"type="tns:StockQuotePortType""#, r#"type="StockQuotePortType""#);

    let document = lather_wsdl::parse(xml).unwrap();
    assert!(document
        .operation("StockQuoteService", "StockQuotePort", "GetLastTradePrice")
        .is_ok());
}
