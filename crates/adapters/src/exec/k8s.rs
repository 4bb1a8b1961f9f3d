// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `PodExecutor` over the Kubernetes exec subresource (websocket attach).

use super::{ExecError, ExecOutput, PodExecutor};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Pod;
use kube::api::{Api, AttachParams};
use kube::Client;
use tokio::io::{AsyncRead, AsyncReadExt};

#[derive(Clone)]
pub struct KubePodExecutor {
    client: Client,
}

impl KubePodExecutor {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

async fn read_all(stream: Option<impl AsyncRead + Unpin>) -> Result<String, ExecError> {
    let mut out = String::new();
    if let Some(mut stream) = stream {
        stream
            .read_to_string(&mut out)
            .await
            .map_err(|e| ExecError::Stream(format!("read failed: {}", e)))?;
    }
    Ok(out)
}

#[async_trait]
impl PodExecutor for KubePodExecutor {
    async fn exec(
        &self,
        namespace: &str,
        pod: &str,
        container: &str,
        command: &[String],
    ) -> Result<ExecOutput, ExecError> {
        let pods: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        let params =
            AttachParams::default().container(container).stdin(false).stdout(true).stderr(true);
        tracing::debug!(pod, container, ?command, "exec");
        let mut attached = pods
            .exec(pod, command.to_vec(), &params)
            .await
            .map_err(|e| ExecError::Stream(format!("exec in {}/{} failed: {}", pod, container, e)))?;

        let status = attached.take_status();
        let (stdout, stderr) = (attached.stdout(), attached.stderr());
        let (stdout, stderr) = tokio::join!(read_all(stdout), read_all(stderr));
        let (stdout, stderr) = (stdout?, stderr?);

        let status = match status {
            Some(status) => status.await,
            None => None,
        };
        attached
            .join()
            .await
            .map_err(|e| ExecError::Stream(format!("exec stream closed: {}", e)))?;

        match status.and_then(|s| s.status) {
            Some(s) if s == "Success" => Ok(ExecOutput { stdout, stderr }),
            Some(s) => Err(ExecError::Failed { status: s, stderr }),
            None => Err(ExecError::Failed { status: "Unknown".to_string(), stderr }),
        }
    }
}
