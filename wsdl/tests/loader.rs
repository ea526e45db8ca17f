use lather_util::Value;
use lather_wsdl::Error;
use std::{fs, path::Path};
use tempfile::TempDir;

const SERVICE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<wsdl:definitions xmlns:wsdl="http://schemas.xmlsoap.org/wsdl/"
    xmlns:soap12="http://schemas.xmlsoap.org/wsdl/soap12/"
    xmlns:tns="urn:lookup"
    targetNamespace="urn:lookup">
  <wsdl:import namespace="urn:lookup" location="abstract/lookup.wsdl"/>
  <wsdl:binding name="LookupSoap12" type="tns:LookupPortType">
    <soap12:binding transport="http://schemas.xmlsoap.org/soap/http"/>
    <wsdl:operation name="Lookup">
      <soap12:operation soapAction="urn:lookup/Lookup" style="document"/>
      <wsdl:input><soap12:body use="literal"/></wsdl:input>
      <wsdl:output><soap12:body use="literal"/></wsdl:output>
    </wsdl:operation>
  </wsdl:binding>
  <wsdl:service name="Lookup">
    <wsdl:port name="LookupSoap12" binding="tns:LookupSoap12">
      <soap12:address location="http://example.com/lookup"/>
    </wsdl:port>
  </wsdl:service>
</wsdl:definitions>
"#;

const ABSTRACT: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<wsdl:definitions xmlns:wsdl="http://schemas.xmlsoap.org/wsdl/"
    xmlns:xs="http://www.w3.org/2001/XMLSchema"
    xmlns:l="urn:lookup"
    targetNamespace="urn:lookup">
  <wsdl:import namespace="urn:lookup" location="../service.wsdl"/>
  <wsdl:types>
    <xs:schema targetNamespace="urn:lookup" elementFormDefault="qualified">
      <xs:include schemaLocation="lookup.xsd"/>
    </xs:schema>
  </wsdl:types>
  <wsdl:message name="LookupIn">
    <wsdl:part name="parameters" element="l:Lookup"/>
  </wsdl:message>
  <wsdl:message name="LookupOut">
    <wsdl:part name="parameters" element="l:LookupResponse"/>
  </wsdl:message>
  <wsdl:portType name="LookupPortType">
    <wsdl:operation name="Lookup">
      <wsdl:input message="l:LookupIn"/>
      <wsdl:output message="l:LookupOut"/>
    </wsdl:operation>
  </wsdl:portType>
</wsdl:definitions>
"#;

const SCHEMA: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
    xmlns:l="urn:lookup"
    targetNamespace="urn:lookup">
  <xs:element name="Lookup">
    <xs:complexType>
      <xs:sequence>
        <xs:element name="Key" type="xs:string"/>
        <xs:element name="Address" type="l:Address"/>
      </xs:sequence>
    </xs:complexType>
  </xs:element>
  <xs:element name="LookupResponse">
    <xs:complexType>
      <xs:sequence>
        <xs:element name="Found" type="xs:boolean"/>
      </xs:sequence>
    </xs:complexType>
  </xs:element>
  <xs:complexType name="Address">
    <xs:sequence>
      <xs:element name="Street" type="xs:string"/>
      <xs:element name="Zip" type="xs:int"/>
    </xs:sequence>
  </xs:complexType>
</xs:schema>
"#;

fn write(dir: &Path, name: &str, contents: &str) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

fn service_dir() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "service.wsdl", SERVICE);
    write(dir.path(), "abstract/lookup.wsdl", ABSTRACT);
    write(dir.path(), "abstract/lookup.xsd", SCHEMA);
    dir
}

#[test]
fn follows_wsdl_and_schema_imports() {
    let dir = service_dir();
    let document = lather_wsdl::load(dir.path().join("service.wsdl").to_str().unwrap()).unwrap();

    let operation = document.operation("Lookup", "LookupSoap12", "Lookup").unwrap();
    assert_eq!(operation.soap_action(), "urn:lookup/Lookup");
    assert_eq!(operation.target_namespace(), "urn:lookup");
    assert_eq!(
        operation.example_body(),
        Value::map([(
            "Lookup",
            Value::map([
                ("Key", Value::from("string")),
                (
                    "Address",
                    Value::map([("Street", "string"), ("Zip", "int")]),
                ),
            ]),
        )])
    );
}

#[test]
fn accepts_file_urls() {
    let dir = service_dir();
    let path = dir.path().join("service.wsdl").canonicalize().unwrap();
    let url = url::Url::from_file_path(path).unwrap();

    let document = lather_wsdl::load(url.as_str()).unwrap();
    assert_eq!(document.services().len(), 1);
}

#[test]
fn missing_file_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.wsdl");

    assert!(matches!(
        lather_wsdl::load(missing.to_str().unwrap()),
        Err(Error::PathConversionError(Some(_)))
    ));
}

#[test]
fn missing_import_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "service.wsdl", SERVICE);

    assert!(matches!(
        lather_wsdl::load(dir.path().join("service.wsdl").to_str().unwrap()),
        Err(Error::FileReadError(_))
    ));
}

#[test]
fn unsupported_scheme_is_rejected() {
    assert!(matches!(
        lather_wsdl::load("ftp://example.com/service.wsdl"),
        Err(Error::UnsupportedScheme(scheme)) if scheme == "ftp"
    ));
}
