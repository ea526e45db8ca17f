use std::{
    fs,
    io::{self, Read},
    time::Duration,
};

use lather::{Client, HttpTransport, Operation};
use structopt::StructOpt;
use thiserror::Error;
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod json;

#[derive(Debug, Error)]
enum Error {
    #[error("Error loading WSDL")]
    WsdlError(#[from] lather_wsdl::Error),

    #[error("{0}")]
    SoapError(#[from] lather::Error),

    #[error("Error setting up HTTP transport")]
    TransportError(#[from] lather::TransportError),

    #[error("Error reading request")]
    IoError(#[from] io::Error),

    #[error("Request body is not valid JSON")]
    JsonError(#[from] serde_json::Error),

    #[error("Pass the request with --body or --envelope")]
    MissingRequest,

    #[error("Service answered with fault {code}: {reason}")]
    Fault { code: String, reason: String },
}

#[derive(StructOpt)]
struct Target {
    service: String,
    port: String,
    operation: String,
}

#[derive(StructOpt)]
struct Request {
    #[structopt(flatten)]
    target: Target,

    /// Overrides the port address
    #[structopt(long)]
    endpoint: Option<String>,

    /// Overrides the binding's SOAP version ("1.1" or "1.2")
    #[structopt(long)]
    soap_version: Option<String>,

    #[structopt(long)]
    soap_action: Option<String>,

    #[structopt(long)]
    encoding: Option<String>,

    /// JSON body file, "-" reads standard input
    #[structopt(long, conflicts_with = "envelope")]
    body: Option<String>,

    /// Prebuilt SOAP envelope file, sent unmodified
    #[structopt(long)]
    envelope: Option<String>,
}

#[derive(StructOpt)]
enum Command {
    /// Lists the SOAP ports of every service
    Services,

    /// Lists the operations of a port
    Operations { service: String, port: String },

    /// Prints a JSON request scaffold for an operation
    Example {
        #[structopt(flatten)]
        target: Target,
    },

    /// Prints the request envelope without sending it
    Build {
        #[structopt(flatten)]
        request: Request,
    },

    /// Sends the request and prints the response body
    Call {
        #[structopt(flatten)]
        request: Request,

        /// Request timeout in seconds, 0 waits indefinitely
        #[structopt(long, default_value = "30")]
        timeout: u64,
    },
}

#[derive(StructOpt)]
struct Args {
    /// More log output, repeat for more
    #[structopt(short, long, parse(from_occurrences))]
    verbose: u8,

    /// WSDL URL or path
    wsdl: String,

    #[structopt(subcommand)]
    command: Command,
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn read_input(location: &str) -> Result<String, Error> {
    if location == "-" {
        let mut input = String::new();
        io::stdin().read_to_string(&mut input)?;
        Ok(input)
    } else {
        Ok(fs::read_to_string(location)?)
    }
}

fn prepare<'a>(client: &'a Client, request: &Request) -> Result<Operation<'a>, Error> {
    let target = &request.target;
    let mut operation = client.operation(&target.service, &target.port, &target.operation)?;

    if let Some(endpoint) = &request.endpoint {
        operation.set_endpoint(endpoint);
    }

    if let Some(version) = &request.soap_version {
        operation.set_soap_version(version);
    }

    if let Some(action) = &request.soap_action {
        operation.set_soap_action(action);
    }

    if let Some(encoding) = &request.encoding {
        operation.set_encoding(encoding);
    }

    match (&request.body, &request.envelope) {
        (Some(body), _) => {
            let json = serde_json::from_str(&read_input(body)?)?;
            operation.set_body(json::to_value(json));
        }

        (None, Some(envelope)) => operation.set_xml_envelope(read_input(envelope)?),

        (None, None) => return Err(Error::MissingRequest),
    }

    debug!(?operation, "prepared operation");
    Ok(operation)
}

#[paw::main]
fn main(args: Args) -> Result<(), Error> {
    init_tracing(args.verbose);

    let timeout = match &args.command {
        Command::Call { timeout: 0, .. } => None,
        Command::Call { timeout, .. } => Some(Duration::from_secs(*timeout)),
        _ => Some(lather::DEFAULT_TIMEOUT),
    };

    let transport = HttpTransport::builder().timeout(timeout).build()?;
    let client = Client::new(lather_wsdl::load(&args.wsdl)?, transport);

    match &args.command {
        Command::Services => {
            for port in client.services() {
                println!(
                    "{}\t{}\t{}\t{}",
                    port.service,
                    port.port,
                    port.soap_version,
                    port.endpoint.unwrap_or("-")
                );
            }
        }

        Command::Operations { service, port } => {
            for operation in client.operations(service, port)? {
                println!("{}", operation);
            }
        }

        Command::Example { target } => {
            let operation = client.operation(&target.service, &target.port, &target.operation)?;
            let example = json::from_value(&operation.example_body());
            println!("{}", serde_json::to_string_pretty(&example)?);
        }

        Command::Build { request } => {
            let operation = prepare(&client, request)?;
            println!("{}", operation.build()?);
        }

        Command::Call { request, .. } => {
            let operation = prepare(&client, request)?;

            match operation.call() {
                Ok(response) => println!("{}", response.text()),

                Err(error) => match error.fault() {
                    Some(fault) => {
                        return Err(Error::Fault {
                            code: fault.code,
                            reason: fault.reason,
                        })
                    }
                    None => return Err(error.into()),
                },
            }
        }
    }

    Ok(())
}
