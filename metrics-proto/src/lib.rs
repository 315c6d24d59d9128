tonic::include_proto!("metrics");
