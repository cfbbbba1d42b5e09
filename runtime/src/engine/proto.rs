//! Wire types and client stub for the `noob.engine.v1.Control` service.
//!
//! The service mirrors the shape of BuildKit's control API, reduced to the
//! calls and fields this client uses:
//!
//! ```text
//! service Control {
//!   rpc Solve(SolveRequest) returns (SolveResponse);
//!   rpc Status(StatusRequest) returns (stream StatusResponse);
//! }
//! ```
//!
//! Messages are declared with the `prost` derive directly so the build does
//! not need `protoc`.

use std::collections::HashMap;

use tonic::transport::Channel;

#[derive(Clone, PartialEq, prost::Message)]
pub struct Definition {
    /// Encoded vertices, dependencies first
    #[prost(bytes = "vec", repeated, tag = "1")]
    pub def: Vec<Vec<u8>>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct SolveRequest {
    #[prost(string, tag = "1")]
    pub r#ref: String,
    #[prost(message, optional, tag = "2")]
    pub definition: Option<Definition>,
    /// Logical local-source name -> absolute host directory
    #[prost(map = "string, string", tag = "3")]
    pub local_dirs: HashMap<String, String>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct SolveResponse {
    #[prost(map = "string, string", tag = "1")]
    pub exporter_response: HashMap<String, String>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct StatusRequest {
    #[prost(string, tag = "1")]
    pub r#ref: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct StatusResponse {
    #[prost(message, repeated, tag = "1")]
    pub vertexes: Vec<Vertex>,
    #[prost(message, repeated, tag = "2")]
    pub statuses: Vec<VertexStatus>,
    #[prost(message, repeated, tag = "3")]
    pub logs: Vec<VertexLog>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Vertex {
    #[prost(string, tag = "1")]
    pub digest: String,
    #[prost(string, repeated, tag = "2")]
    pub inputs: Vec<String>,
    #[prost(string, tag = "3")]
    pub name: String,
    #[prost(bool, tag = "4")]
    pub cached: bool,
    #[prost(bool, tag = "5")]
    pub completed: bool,
    #[prost(string, tag = "6")]
    pub error: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct VertexStatus {
    #[prost(string, tag = "1")]
    pub id: String,
    #[prost(string, tag = "2")]
    pub vertex: String,
    #[prost(string, tag = "3")]
    pub name: String,
    #[prost(int64, tag = "4")]
    pub current: i64,
    #[prost(int64, tag = "5")]
    pub total: i64,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct VertexLog {
    #[prost(string, tag = "1")]
    pub vertex: String,
    #[prost(int64, tag = "2")]
    pub stream: i64,
    #[prost(bytes = "vec", tag = "3")]
    pub msg: Vec<u8>,
}

const SOLVE_PATH: &str = "/noob.engine.v1.Control/Solve";
const STATUS_PATH: &str = "/noob.engine.v1.Control/Status";

/// gRPC client for the control service.
#[derive(Debug, Clone)]
pub struct ControlClient {
    inner: tonic::client::Grpc<Channel>,
}

impl ControlClient {
    pub fn new(channel: Channel) -> Self {
        Self {
            inner: tonic::client::Grpc::new(channel),
        }
    }

    /// Submit a definition and wait for the build to finish.
    pub async fn solve(
        &mut self,
        request: SolveRequest,
    ) -> Result<tonic::Response<SolveResponse>, tonic::Status> {
        self.ready().await?;
        let codec = tonic::codec::ProstCodec::default();
        let path = http::uri::PathAndQuery::from_static(SOLVE_PATH);
        self.inner
            .unary(tonic::Request::new(request), path, codec)
            .await
    }

    /// Subscribe to progress for a build ref.
    pub async fn status(
        &mut self,
        request: StatusRequest,
    ) -> Result<tonic::Response<tonic::codec::Streaming<StatusResponse>>, tonic::Status> {
        self.ready().await?;
        let codec = tonic::codec::ProstCodec::default();
        let path = http::uri::PathAndQuery::from_static(STATUS_PATH);
        self.inner
            .server_streaming(tonic::Request::new(request), path, codec)
            .await
    }

    async fn ready(&mut self) -> Result<(), tonic::Status> {
        self.inner.ready().await.map_err(|e| {
            tonic::Status::new(
                tonic::Code::Unavailable,
                format!("Service was not ready: {}", e),
            )
        })
    }
}
