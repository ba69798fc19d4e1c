//! Command executor: wraps a [`Command`] in its envelope, sends it through a
//! [`Transport`] and unwraps the command-specific result.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::{
    commands::Command,
    error::Error,
    transport::{DeviceConfig, TcpTransport, Transport},
};

/// Sends commands to one device and returns their results.
///
/// # Example
///
/// ```no_run
/// use tplink_core::{Client, DeviceConfig, commands::{self, Command}};
///
/// #[tokio::main]
/// async fn main() -> Result<(), tplink_core::Error> {
///     let client = Client::new(&DeviceConfig::new("192.168.1.100"));
///     let info = client
///         .execute(&Command::query(commands::SYSTEM, commands::GET_SYSINFO))
///         .await?;
///     println!("{}", info["alias"]);
///     Ok(())
/// }
/// ```
pub struct Client {
    transport: Box<dyn Transport>,
}

impl Client {
    /// Creates a client that talks TCP to the endpoint in `config`.
    pub fn new(config: &DeviceConfig) -> Self {
        Self::with_transport(TcpTransport::new(config))
    }

    /// Creates a client over an arbitrary transport.
    pub fn with_transport(transport: impl Transport + 'static) -> Self {
        Self {
            transport: Box::new(transport),
        }
    }

    /// The device host this client talks to.
    pub fn host(&self) -> &str {
        self.transport.host()
    }

    /// The device port this client talks to.
    pub fn port(&self) -> u16 {
        self.transport.port()
    }

    /// Executes `command` and returns `response[system][command]`.
    ///
    /// # Errors
    ///
    /// - transport errors from the underlying [`Transport`]
    /// - [`Error::ParseError`] if the response is not JSON
    /// - [`Error::Protocol`] if the system or command key is missing
    /// - [`Error::DeviceError`] if the result carries a non-zero `err_code`
    pub async fn execute(&self, command: &Command) -> Result<Value, Error> {
        let request = command.envelope().to_string();
        debug!(
            system = command.system(),
            command = command.command(),
            host = self.host(),
            "executing command"
        );

        let response = self.transport.send(request.as_bytes()).await?;
        let response: Value =
            serde_json::from_slice(&response).map_err(|e| Error::ParseError(e.to_string()))?;

        extract_result(response, command.system(), command.command())
    }

    /// Executes a bare query (`null` parameters).
    pub async fn query(&self, system: &str, command: &str) -> Result<Value, Error> {
        self.execute(&Command::query(system, command)).await
    }

    /// Executes `command` and deserializes the result into `T`.
    pub async fn execute_as<T: DeserializeOwned>(&self, command: &Command) -> Result<T, Error> {
        let result = self.execute(command).await?;
        serde_json::from_value(result).map_err(|e| {
            Error::Protocol(format!(
                "unexpected {}/{} result: {}",
                command.system(),
                command.command(),
                e
            ))
        })
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("host", &self.host())
            .field("port", &self.port())
            .finish()
    }
}

/// Descends into `response[system][command]` and checks its `err_code`.
fn extract_result(mut response: Value, system: &str, command: &str) -> Result<Value, Error> {
    let Some(service) = response.get_mut(system) else {
        return Err(Error::Protocol(format!(
            "response has no `{}` object",
            system
        )));
    };

    let Some(result) = service.get_mut(command) else {
        // Unknown commands are answered at the system level,
        // e.g. {"system":{"err_code":-2,"err_msg":"member not support"}}
        check_err_code(service)?;
        return Err(Error::Protocol(format!(
            "response has no `{}.{}` object",
            system, command
        )));
    };

    check_err_code(result)?;
    Ok(result.take())
}

fn check_err_code(value: &Value) -> Result<(), Error> {
    let code = value.get("err_code").and_then(Value::as_i64).unwrap_or(0);
    if code == 0 {
        return Ok(());
    }

    Err(Error::DeviceError {
        code,
        message: value
            .get("err_msg")
            .and_then(Value::as_str)
            .map(str::to_owned),
    })
}
