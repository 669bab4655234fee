//! Catalogue of the upstream operations the proxy exposes.

use std::fmt;

use bytes::Bytes;
use ginku::CacheKey;
use ginku_reqwest::{Shape, UpstreamClient, UpstreamError};
use smol_str::SmolStr;

/// How long a cached response may be served.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// The process-wide cache TTL.
    Default,
    /// The shorter TTL for real-time data.
    Realtime,
}

/// One upstream call the proxy can make.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Every stop of the network.
    Stops,
    /// Details of one vehicle, by number.
    VehicleDetails,
    /// Every line of the network.
    Lines,
    /// Stops served by one variant of a line.
    VariantStops,
    /// Line variants serving one stop.
    StopVariants,
    /// Next departures at a stop, by stop name.
    WaitTimes,
    /// Current status and disruptions of every line.
    LineStatus,
    /// Messages published for one line.
    LineMessages,
}

impl Operation {
    /// Every operation, in route order.
    pub const ALL: [Operation; 8] = [
        Operation::Stops,
        Operation::VehicleDetails,
        Operation::Lines,
        Operation::VariantStops,
        Operation::StopVariants,
        Operation::WaitTimes,
        Operation::LineStatus,
        Operation::LineMessages,
    ];

    /// Name used as cache key prefix and in logs.
    pub const fn name(self) -> &'static str {
        match self {
            Operation::Stops => "search",
            Operation::VehicleDetails => "detailsVehicule",
            Operation::Lines => "getLingnes",
            Operation::VariantStops => "getArretFromLigne",
            Operation::StopVariants => "getVariantesDesservantArret",
            Operation::WaitTimes => "getTempsLieu",
            Operation::LineStatus => "etatLignes",
            Operation::LineMessages => "messages",
        }
    }

    /// Upstream path, relative to the API base URL.
    pub const fn path(self) -> &'static str {
        match self {
            Operation::Stops => "DR/getArrets.do",
            Operation::VehicleDetails => "DR/getDetailsVehicule.do",
            Operation::Lines => "DR/getLignes.do",
            Operation::VariantStops => "DR/getDetailsVariante.do",
            Operation::StopVariants => "DR/getVariantesDesservantArret.do",
            Operation::WaitTimes => "TR/getTempsLieu.do",
            Operation::LineStatus => "TR/getEtatLignes.do",
            Operation::LineMessages => "TR/getMessages.do",
        }
    }

    /// Names of the caller-supplied parameters, in key order.
    pub const fn params(self) -> &'static [&'static str] {
        match self {
            Operation::VehicleDetails => &["num"],
            Operation::VariantStops => &["idLigne", "idVariante"],
            Operation::StopVariants => &["idArret"],
            Operation::WaitTimes => &["nom"],
            Operation::LineMessages => &["idLigne"],
            Operation::Stops | Operation::Lines | Operation::LineStatus => &[],
        }
    }

    /// Parameters sent with every call, not part of the cache key.
    pub const fn fixed_params(self) -> &'static [(&'static str, &'static str)] {
        match self {
            Operation::WaitTimes => &[("nb", "3")],
            _ => &[],
        }
    }

    /// Expected shape of the `objets` payload.
    pub const fn shape(self) -> Shape {
        match self {
            Operation::VehicleDetails | Operation::WaitTimes => Shape::Any,
            _ => Shape::Sequence,
        }
    }

    /// TTL class of the operation's responses.
    pub const fn freshness(self) -> Freshness {
        match self {
            Operation::WaitTimes => Freshness::Realtime,
            _ => Freshness::Default,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An operation bound to its parameter values.
#[derive(Debug, Clone)]
pub struct UpstreamRequest {
    operation: Operation,
    args: Vec<SmolStr>,
}

impl UpstreamRequest {
    /// Binds `args` to the operation's parameters, positionally.
    pub fn new<I>(operation: Operation, args: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<SmolStr>,
    {
        let args: Vec<SmolStr> = args.into_iter().map(Into::into).collect();
        debug_assert_eq!(args.len(), operation.params().len());
        Self { operation, args }
    }

    /// The bound operation.
    pub fn operation(&self) -> Operation {
        self.operation
    }

    /// Deterministic key: the operation name, then each parameter in declared order.
    pub fn cache_key(&self) -> CacheKey {
        self.named_args()
            .fold(CacheKey::builder(self.operation.name()), |key, (name, value)| {
                key.part(name, value.as_str())
            })
            .into_cache_key()
    }

    /// Calls upstream and returns the `objets` payload serialized as JSON.
    pub async fn fetch(self, client: UpstreamClient) -> Result<Bytes, UpstreamError> {
        let operation = self.operation;
        let query: Vec<(&str, &str)> = self
            .named_args()
            .map(|(name, value)| (name, value.as_str()))
            .chain(
                operation
                    .fixed_params()
                    .iter()
                    .map(|&(name, value)| (name, value)),
            )
            .collect();

        let payload = client
            .get_objects(operation.path(), &query, operation.shape())
            .await?;
        serde_json::to_vec(&payload)
            .map(Bytes::from)
            .map_err(|error| UpstreamError::Malformed {
                path: operation.path().into(),
                reason: error.to_string().into(),
            })
    }

    fn named_args(&self) -> impl Iterator<Item = (&'static str, &SmolStr)> {
        self.operation.params().iter().copied().zip(&self.args)
    }
}
