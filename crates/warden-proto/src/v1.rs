// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

// Vendored prost/tonic output for proto/warden/api/v1/snapshot.proto,
// trimmed to the surface the workspace uses.

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SecretInfo {
	/// Opaque id, used as the JWT `kid`.
	#[prost(string, tag = "1")]
	pub secret_id: ::prost::alloc::string::String,
	#[prost(string, tag = "2")]
	pub username: ::prost::alloc::string::String,
	/// Raw HMAC key material.
	#[prost(string, tag = "3")]
	pub secret_key: ::prost::alloc::string::String,
	/// Unix seconds; zero means the secret never expires.
	#[prost(int64, tag = "4")]
	pub expires: i64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PolicyInfo {
	#[prost(string, tag = "1")]
	pub username: ::prost::alloc::string::String,
	/// JSON-encoded policy document as stored by the control plane.
	#[prost(string, tag = "2")]
	pub policy_shadow: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ListSecretsRequest {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ListSecretsResponse {
	#[prost(message, repeated, tag = "1")]
	pub items: ::prost::alloc::vec::Vec<SecretInfo>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ListPoliciesRequest {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ListPoliciesResponse {
	#[prost(message, repeated, tag = "1")]
	pub items: ::prost::alloc::vec::Vec<PolicyInfo>,
}

/// Generated client implementations.
pub mod snapshot_client {
	#![allow(
		unused_variables,
		dead_code,
		missing_docs,
		clippy::wildcard_imports,
		clippy::let_unit_value
	)]
	use tonic::codegen::http::Uri;
	use tonic::codegen::*;

	#[derive(Debug, Clone)]
	pub struct SnapshotClient<T> {
		inner: tonic::client::Grpc<T>,
	}

	impl SnapshotClient<tonic::transport::Channel> {
		/// Attempt to create a new client by connecting to a given endpoint.
		pub async fn connect<D>(dst: D) -> Result<Self, tonic::transport::Error>
		where
			D: TryInto<tonic::transport::Endpoint>,
			D::Error: Into<StdError>,
		{
			let conn = tonic::transport::Endpoint::new(dst)?.connect().await?;
			Ok(Self::new(conn))
		}
	}

	impl<T> SnapshotClient<T>
	where
		T: tonic::client::GrpcService<tonic::body::BoxBody>,
		T::Error: Into<StdError>,
		T::ResponseBody: Body<Data = Bytes> + std::marker::Send + 'static,
		<T::ResponseBody as Body>::Error: Into<StdError> + std::marker::Send,
	{
		pub fn new(inner: T) -> Self {
			let inner = tonic::client::Grpc::new(inner);
			Self { inner }
		}

		pub fn with_origin(inner: T, origin: Uri) -> Self {
			let inner = tonic::client::Grpc::with_origin(inner, origin);
			Self { inner }
		}

		/// Limits the maximum size of a decoded message.
		///
		/// Default: `4MB`
		#[must_use]
		pub fn max_decoding_message_size(mut self, limit: usize) -> Self {
			self.inner = self.inner.max_decoding_message_size(limit);
			self
		}

		/// Limits the maximum size of an encoded message.
		///
		/// Default: `usize::MAX`
		#[must_use]
		pub fn max_encoding_message_size(mut self, limit: usize) -> Self {
			self.inner = self.inner.max_encoding_message_size(limit);
			self
		}

		pub async fn list_secrets(
			&mut self,
			request: impl tonic::IntoRequest<super::ListSecretsRequest>,
		) -> std::result::Result<tonic::Response<super::ListSecretsResponse>, tonic::Status> {
			self.inner.ready().await.map_err(|e| {
				tonic::Status::unknown(format!("Service was not ready: {}", e.into()))
			})?;
			let codec = tonic::codec::ProstCodec::default();
			let path =
				http::uri::PathAndQuery::from_static("/warden.api.v1.Snapshot/ListSecrets");
			let mut req = request.into_request();
			req.extensions_mut()
				.insert(GrpcMethod::new("warden.api.v1.Snapshot", "ListSecrets"));
			self.inner.unary(req, path, codec).await
		}

		pub async fn list_policies(
			&mut self,
			request: impl tonic::IntoRequest<super::ListPoliciesRequest>,
		) -> std::result::Result<tonic::Response<super::ListPoliciesResponse>, tonic::Status> {
			self.inner.ready().await.map_err(|e| {
				tonic::Status::unknown(format!("Service was not ready: {}", e.into()))
			})?;
			let codec = tonic::codec::ProstCodec::default();
			let path =
				http::uri::PathAndQuery::from_static("/warden.api.v1.Snapshot/ListPolicies");
			let mut req = request.into_request();
			req.extensions_mut()
				.insert(GrpcMethod::new("warden.api.v1.Snapshot", "ListPolicies"));
			self.inner.unary(req, path, codec).await
		}
	}
}

/// Generated server implementations.
pub mod snapshot_server {
	#![allow(
		unused_variables,
		dead_code,
		missing_docs,
		clippy::wildcard_imports
	)]
	use std::sync::Arc;

	use tonic::codegen::*;

	/// Generated trait containing gRPC methods that should be implemented
	/// for use with SnapshotServer.
	#[async_trait]
	pub trait Snapshot: std::marker::Send + std::marker::Sync + 'static {
		async fn list_secrets(
			&self,
			request: tonic::Request<super::ListSecretsRequest>,
		) -> std::result::Result<tonic::Response<super::ListSecretsResponse>, tonic::Status>;

		async fn list_policies(
			&self,
			request: tonic::Request<super::ListPoliciesRequest>,
		) -> std::result::Result<tonic::Response<super::ListPoliciesResponse>, tonic::Status>;
	}

	#[derive(Debug)]
	pub struct SnapshotServer<T> {
		inner: Arc<T>,
		accept_compression_encodings: EnabledCompressionEncodings,
		send_compression_encodings: EnabledCompressionEncodings,
		max_decoding_message_size: Option<usize>,
		max_encoding_message_size: Option<usize>,
	}

	impl<T> SnapshotServer<T> {
		pub fn new(inner: T) -> Self {
			Self::from_arc(Arc::new(inner))
		}

		pub fn from_arc(inner: Arc<T>) -> Self {
			Self {
				inner,
				accept_compression_encodings: Default::default(),
				send_compression_encodings: Default::default(),
				max_decoding_message_size: None,
				max_encoding_message_size: None,
			}
		}

		/// Limits the maximum size of a decoded message.
		///
		/// Default: `4MB`
		#[must_use]
		pub fn max_decoding_message_size(mut self, limit: usize) -> Self {
			self.max_decoding_message_size = Some(limit);
			self
		}

		/// Limits the maximum size of an encoded message.
		///
		/// Default: `usize::MAX`
		#[must_use]
		pub fn max_encoding_message_size(mut self, limit: usize) -> Self {
			self.max_encoding_message_size = Some(limit);
			self
		}
	}

	impl<T, B> tonic::codegen::Service<http::Request<B>> for SnapshotServer<T>
	where
		T: Snapshot,
		B: Body + std::marker::Send + 'static,
		B::Error: Into<StdError> + std::marker::Send + 'static,
	{
		type Response = http::Response<tonic::body::BoxBody>;
		type Error = std::convert::Infallible;
		type Future = BoxFuture<Self::Response, Self::Error>;

		fn poll_ready(
			&mut self,
			_cx: &mut Context<'_>,
		) -> Poll<std::result::Result<(), Self::Error>> {
			Poll::Ready(Ok(()))
		}

		fn call(&mut self, req: http::Request<B>) -> Self::Future {
			match req.uri().path() {
				"/warden.api.v1.Snapshot/ListSecrets" => {
					#[allow(non_camel_case_types)]
					struct ListSecretsSvc<T: Snapshot>(pub Arc<T>);
					impl<T: Snapshot> tonic::server::UnaryService<super::ListSecretsRequest>
						for ListSecretsSvc<T>
					{
						type Response = super::ListSecretsResponse;
						type Future = BoxFuture<tonic::Response<Self::Response>, tonic::Status>;
						fn call(
							&mut self,
							request: tonic::Request<super::ListSecretsRequest>,
						) -> Self::Future {
							let inner = Arc::clone(&self.0);
							let fut =
								async move { <T as Snapshot>::list_secrets(&inner, request).await };
							Box::pin(fut)
						}
					}
					let accept_compression_encodings = self.accept_compression_encodings;
					let send_compression_encodings = self.send_compression_encodings;
					let max_decoding_message_size = self.max_decoding_message_size;
					let max_encoding_message_size = self.max_encoding_message_size;
					let inner = self.inner.clone();
					let fut = async move {
						let method = ListSecretsSvc(inner);
						let codec = tonic::codec::ProstCodec::default();
						let mut grpc = tonic::server::Grpc::new(codec)
							.apply_compression_config(
								accept_compression_encodings,
								send_compression_encodings,
							)
							.apply_max_message_size_config(
								max_decoding_message_size,
								max_encoding_message_size,
							);
						let res = grpc.unary(method, req).await;
						Ok(res)
					};
					Box::pin(fut)
				}
				"/warden.api.v1.Snapshot/ListPolicies" => {
					#[allow(non_camel_case_types)]
					struct ListPoliciesSvc<T: Snapshot>(pub Arc<T>);
					impl<T: Snapshot> tonic::server::UnaryService<super::ListPoliciesRequest>
						for ListPoliciesSvc<T>
					{
						type Response = super::ListPoliciesResponse;
						type Future = BoxFuture<tonic::Response<Self::Response>, tonic::Status>;
						fn call(
							&mut self,
							request: tonic::Request<super::ListPoliciesRequest>,
						) -> Self::Future {
							let inner = Arc::clone(&self.0);
							let fut = async move {
								<T as Snapshot>::list_policies(&inner, request).await
							};
							Box::pin(fut)
						}
					}
					let accept_compression_encodings = self.accept_compression_encodings;
					let send_compression_encodings = self.send_compression_encodings;
					let max_decoding_message_size = self.max_decoding_message_size;
					let max_encoding_message_size = self.max_encoding_message_size;
					let inner = self.inner.clone();
					let fut = async move {
						let method = ListPoliciesSvc(inner);
						let codec = tonic::codec::ProstCodec::default();
						let mut grpc = tonic::server::Grpc::new(codec)
							.apply_compression_config(
								accept_compression_encodings,
								send_compression_encodings,
							)
							.apply_max_message_size_config(
								max_decoding_message_size,
								max_encoding_message_size,
							);
						let res = grpc.unary(method, req).await;
						Ok(res)
					};
					Box::pin(fut)
				}
				_ => Box::pin(async move {
					Ok(http::Response::builder()
						.status(200)
						.header("grpc-status", tonic::Code::Unimplemented as i32)
						.header(http::header::CONTENT_TYPE, "application/grpc")
						.body(empty_body())
						.unwrap())
				}),
			}
		}
	}

	impl<T> Clone for SnapshotServer<T> {
		fn clone(&self) -> Self {
			let inner = self.inner.clone();
			Self {
				inner,
				accept_compression_encodings: self.accept_compression_encodings,
				send_compression_encodings: self.send_compression_encodings,
				max_decoding_message_size: self.max_decoding_message_size,
				max_encoding_message_size: self.max_encoding_message_size,
			}
		}
	}

	/// Generated gRPC service name
	pub const SERVICE_NAME: &str = "warden.api.v1.Snapshot";

	impl<T> tonic::server::NamedService for SnapshotServer<T> {
		const NAME: &'static str = SERVICE_NAME;
	}
}
