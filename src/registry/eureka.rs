//! Eureka REST/JSON registry client.
//!
//! # Endpoints
//! - `POST   {base}/apps/{APP}`          register
//! - `PUT    {base}/apps/{APP}/{id}`     heartbeat (404 = lease unknown)
//! - `DELETE {base}/apps/{APP}/{id}`     deregister
//! - `GET    {base}/apps`                list applications
//!
//! # Design Decisions
//! - One immutable `reqwest::Client` per registry client, timeout from config
//! - Application names are upper-cased, as the registry stores them
//! - Listings tolerate the registry's single-object-instead-of-array encoding

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::registry::client::RegistryClient;
use crate::registry::types::{
    ApplicationView, DataCenterKind, InstanceDescriptor, InstanceKey, InstanceStatus,
    InstanceView, RegistryError, RegistryResult,
};

const DEFAULT_DATA_CENTER_CLASS: &str = "com.netflix.appinfo.InstanceInfo$DefaultDataCenterInfo";
const AMAZON_DATA_CENTER_CLASS: &str = "com.netflix.appinfo.AmazonInfo";

/// Registry client speaking the Eureka REST protocol.
#[derive(Debug, Clone)]
pub struct EurekaClient {
    base_url: String,
    client: reqwest::Client,
    timeout: Duration,
}

impl EurekaClient {
    /// Create a client for the registry at `base_url`
    /// (e.g. `http://localhost:8761/eureka`).
    pub fn new(base_url: &str, timeout: Duration) -> RegistryResult<Self> {
        let parsed = Url::parse(base_url)
            .map_err(|e| RegistryError::InvalidUrl(format!("'{}': {}", base_url, e)))?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(RegistryError::InvalidUrl(format!(
                "'{}': scheme must be http or https",
                base_url
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RegistryError::Transport(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn app_url(&self, app_name: &str) -> String {
        format!("{}/apps/{}", self.base_url, app_name.to_uppercase())
    }

    fn instance_url(&self, key: &InstanceKey) -> String {
        format!("{}/{}", self.app_url(&key.app_name), key.host_name)
    }

    fn map_send_error(&self, err: reqwest::Error) -> RegistryError {
        if err.is_timeout() {
            RegistryError::Timeout(self.timeout)
        } else {
            RegistryError::Transport(err.to_string())
        }
    }
}

#[async_trait]
impl RegistryClient for EurekaClient {
    async fn register(&self, instance: &InstanceDescriptor) -> RegistryResult<()> {
        let body = RegisterBody {
            instance: WireInstance::from_descriptor(instance),
        };

        let response = self
            .client
            .post(self.app_url(instance.app_name()))
            .header(CONTENT_TYPE, "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RegistryError::UnexpectedStatus {
                operation: "register",
                status: status.as_u16(),
            });
        }
        Ok(())
    }

    async fn heartbeat(&self, key: &InstanceKey) -> RegistryResult<()> {
        let response = self
            .client
            .put(self.instance_url(key))
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        match response.status() {
            s if s.is_success() => Ok(()),
            StatusCode::NOT_FOUND => Err(RegistryError::NotRegistered(key.clone())),
            s => Err(RegistryError::UnexpectedStatus {
                operation: "heartbeat",
                status: s.as_u16(),
            }),
        }
    }

    async fn deregister(&self, key: &InstanceKey) -> RegistryResult<()> {
        let response = self
            .client
            .delete(self.instance_url(key))
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        match response.status() {
            s if s.is_success() => Ok(()),
            StatusCode::NOT_FOUND => Err(RegistryError::NotRegistered(key.clone())),
            s => Err(RegistryError::UnexpectedStatus {
                operation: "deregister",
                status: s.as_u16(),
            }),
        }
    }

    async fn list_applications(&self) -> RegistryResult<Vec<ApplicationView>> {
        let response = self
            .client
            .get(format!("{}/apps", self.base_url))
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RegistryError::UnexpectedStatus {
                operation: "list applications",
                status: status.as_u16(),
            });
        }

        let text = response.text().await.map_err(|e| self.map_send_error(e))?;
        decode_applications(&text)
    }
}

/// Decode a `GET /apps` JSON document.
pub fn decode_applications(body: &str) -> RegistryResult<Vec<ApplicationView>> {
    let envelope: AppsEnvelope =
        serde_json::from_str(body).map_err(|e| RegistryError::Decode(e.to_string()))?;

    Ok(envelope
        .applications
        .application
        .into_vec()
        .into_iter()
        .map(|app| ApplicationView {
            name: app.name,
            instances: app
                .instance
                .into_vec()
                .into_iter()
                .map(WireListedInstance::into_view)
                .collect(),
        })
        .collect())
}

// --- Wire format ---

#[derive(Serialize)]
struct RegisterBody<'a> {
    instance: WireInstance<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireInstance<'a> {
    instance_id: &'a str,
    host_name: &'a str,
    app: String,
    ip_addr: &'a str,
    vip_address: &'a str,
    status: InstanceStatus,
    port: WirePort,
    secure_port: WirePort,
    data_center_info: WireDataCenter,
}

impl<'a> WireInstance<'a> {
    fn from_descriptor(d: &'a InstanceDescriptor) -> Self {
        let class = match d.data_center() {
            DataCenterKind::MyOwn => DEFAULT_DATA_CENTER_CLASS,
            DataCenterKind::Amazon => AMAZON_DATA_CENTER_CLASS,
        };
        Self {
            instance_id: d.instance_id(),
            host_name: d.host_name(),
            app: d.app_name().to_uppercase(),
            ip_addr: d.ip_address(),
            vip_address: d.virtual_address(),
            status: d.status(),
            port: WirePort {
                value: d.port(),
                enabled: "true",
            },
            secure_port: WirePort {
                value: 443,
                enabled: "false",
            },
            data_center_info: WireDataCenter {
                class,
                name: d.data_center().as_str(),
            },
        }
    }
}

#[derive(Serialize)]
struct WirePort {
    #[serde(rename = "$")]
    value: u16,
    #[serde(rename = "@enabled")]
    enabled: &'static str,
}

#[derive(Serialize)]
struct WireDataCenter {
    #[serde(rename = "@class")]
    class: &'static str,
    name: &'static str,
}

#[derive(Deserialize)]
struct AppsEnvelope {
    applications: WireApplications,
}

#[derive(Deserialize)]
struct WireApplications {
    #[serde(default)]
    application: OneOrMany<WireApplication>,
}

#[derive(Deserialize)]
struct WireApplication {
    name: String,
    #[serde(default)]
    instance: OneOrMany<WireListedInstance>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireListedInstance {
    host_name: String,
    #[serde(default)]
    ip_addr: String,
    #[serde(default)]
    port: Option<WireListedPort>,
    #[serde(default)]
    status: Option<InstanceStatus>,
}

impl WireListedInstance {
    fn into_view(self) -> InstanceView {
        let port = self.port.map(|p| p.value.as_port()).unwrap_or(0);
        InstanceView {
            host_name: self.host_name,
            ip_address: self.ip_addr,
            port,
            status: self.status.unwrap_or_default(),
        }
    }
}

#[derive(Deserialize)]
struct WireListedPort {
    #[serde(rename = "$")]
    value: PortValue,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PortValue {
    Number(u16),
    Text(String),
}

impl PortValue {
    fn as_port(&self) -> u16 {
        match self {
            PortValue::Number(n) => *n,
            PortValue::Text(s) => s.trim().parse().unwrap_or(0),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> Default for OneOrMany<T> {
    fn default() -> Self {
        OneOrMany::Many(Vec::new())
    }
}

impl<T> OneOrMany<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::Many(v) => v,
            OneOrMany::One(t) => vec![t],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_body_shape() {
        let mut d = InstanceDescriptor::new("host-a", "10.0.0.5", 8090, "orders");
        d.set_status(InstanceStatus::Up);
        let body = RegisterBody {
            instance: WireInstance::from_descriptor(&d),
        };
        let json = serde_json::to_value(&body).unwrap();
        let inst = &json["instance"];

        assert_eq!(inst["hostName"], "host-a");
        assert_eq!(inst["app"], "ORDERS");
        assert_eq!(inst["ipAddr"], "10.0.0.5");
        assert_eq!(inst["vipAddress"], "orders");
        assert_eq!(inst["status"], "UP");
        assert_eq!(inst["port"]["$"], 8090);
        assert_eq!(inst["port"]["@enabled"], "true");
        assert_eq!(inst["dataCenterInfo"]["name"], "MyOwn");
        assert_eq!(inst["dataCenterInfo"]["@class"], DEFAULT_DATA_CENTER_CLASS);
    }

    #[test]
    fn test_amazon_data_center_class() {
        let d = InstanceDescriptor::new("h", "10.0.0.5", 80, "A")
            .with_data_center(DataCenterKind::Amazon);
        let json = serde_json::to_value(WireInstance::from_descriptor(&d)).unwrap();
        assert_eq!(json["dataCenterInfo"]["@class"], AMAZON_DATA_CENTER_CLASS);
        assert_eq!(json["dataCenterInfo"]["name"], "Amazon");
    }

    #[test]
    fn test_decode_arrays() {
        let body = r#"{"applications":{"versions__delta":"1","application":[
            {"name":"ORDERS","instance":[
                {"hostName":"a","ipAddr":"10.0.0.1","status":"UP","port":{"$":9001,"@enabled":"true"}},
                {"hostName":"b","ipAddr":"10.0.0.2","status":"DOWN","port":{"$":9002,"@enabled":"true"}}
            ]}
        ]}}"#;
        let apps = decode_applications(body).unwrap();
        assert_eq!(apps.len(), 1);
        assert_eq!(apps[0].name, "ORDERS");
        assert_eq!(apps[0].instances[1].port, 9002);
        assert_eq!(apps[0].instances[1].status, InstanceStatus::Down);
    }

    #[test]
    fn test_decode_single_objects_and_string_port() {
        let body = r#"{"applications":{"application":
            {"name":"BILLING","instance":
                {"hostName":"c","ipAddr":"10.0.0.3","port":{"$":"7001","@enabled":"true"}}
            }
        }}"#;
        let apps = decode_applications(body).unwrap();
        assert_eq!(apps[0].instances.len(), 1);
        assert_eq!(apps[0].instances[0].port, 7001);
        assert_eq!(apps[0].instances[0].status, InstanceStatus::Unknown);
    }

    #[test]
    fn test_decode_empty_registry() {
        let apps = decode_applications(r#"{"applications":{"application":[]}}"#).unwrap();
        assert!(apps.is_empty());
        let apps = decode_applications(r#"{"applications":{}}"#).unwrap();
        assert!(apps.is_empty());
    }

    #[test]
    fn test_decode_garbage() {
        assert!(matches!(
            decode_applications("<xml/>"),
            Err(RegistryError::Decode(_))
        ));
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            EurekaClient::new("not a url", Duration::from_secs(1)),
            Err(RegistryError::InvalidUrl(_))
        ));
        assert!(matches!(
            EurekaClient::new("ftp://registry/eureka", Duration::from_secs(1)),
            Err(RegistryError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_urls() {
        let client =
            EurekaClient::new("http://localhost:8761/eureka/", Duration::from_secs(1)).unwrap();
        assert_eq!(client.base_url(), "http://localhost:8761/eureka");
        assert_eq!(
            client.instance_url(&InstanceKey::new("host-a", "orders")),
            "http://localhost:8761/eureka/apps/ORDERS/host-a"
        );
    }
}
