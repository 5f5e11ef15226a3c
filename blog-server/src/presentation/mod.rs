pub mod grpc_service;
