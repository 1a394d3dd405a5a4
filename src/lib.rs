//! `zstack-edge-http` is an async HTTP client for the ZStack Edge open API.
//!
//! Every request is signed with the access key pair. Mutating calls that the
//! backend runs as deferred actions are polled to completion:
//! - [`EdgeClient::get`], [`EdgeClient::list`] and [`EdgeClient::page`] read resources
//! - [`EdgeClient::dispatch`] and [`EdgeClient::submit`] mutate them
//! - [`EdgeClient::get_action_result`] checks a deferred action once
//!
//! Typed cluster, node, external network, cloud administration and project
//! registry operations sit on top of these.

mod account;
mod client;
mod cloud;
mod cluster;
mod crypto;
mod envelope;
mod error;
mod network;
mod node;
mod options;
mod params;
mod poll;
mod project;
mod query;
mod request;
mod sign;
mod types;

pub use client::EdgeClient;
pub use crypto::{decrypt_by_access_key, encrypt_by_access_key};
pub use envelope::Envelope;
pub use error::{EdgeError, ErrorKind};
pub use options::{
    ClientOptions, RetryBudget, RetryPolicy, DEFAULT_CONTEXT_PATH, DEFAULT_PORT, DEFAULT_PROTOCOL,
};
pub use params::{
    CloudProjectCreateParam, CloudProjectUpdateParam, CloudProjectUserAddParam,
    CloudUserCreateParam, ClusterCreateNodeParam, ClusterCreateParam, ClusterNodeRole,
    ContainerPackageParam, ContainerRuntime, ExternalNetworkCreateParam,
    ExternalNetworkIpPoolCreateParam, GpuProduct, ImageImportApplyParam, ImageImportConfirmParam,
    ImageUrlImportParam, IpPoolType, NodeAddObjParam, NodeAddParam, ProjectQuotaParam,
    RepositoryCreateParam, RepositoryType, ResourceQuota,
};
pub use query::QueryParams;
pub use request::Request;
pub use sign::{format_date, SignedHeaders, Signer, AUTH_SCHEME};
pub use types::{
    ActionStatus, CloudResourceQuotaView, ClusterConfigView, ClusterDetailsView,
    ClusterOperationView, ClusterSimpleItem, ClusterSpinnerView, ClusterView, DiskInfoView,
    Dispatched, ExternalNetworkIpPoolView, ExternalNetworkView, ImageImportApplyView,
    ImageTagView, ImageView, Mode, NamespaceView, NodeIfaceAllResult, NodeIfaceMap,
    NodeIfaceWithRouteIface, NodeInterfaceInfo, NodeView, Page, ProductInfoView, ProjectView,
    RepositoryView, UserProjectSimpleView, UserView, CLUSTER_STATUS_CREATE_FAILED,
};

pub type Result<T> = std::result::Result<T, EdgeError>;
