//! A deployed contract addressed through its JSON ABI.

use alloy::dyn_abi::{DynSolValue, FunctionExt, JsonAbiExt};
use alloy::json_abi::{Event, Function, JsonAbi};
use alloy::primitives::{Address, Bytes};

use crate::blockchain::client::ChainClient;
use crate::blockchain::types::{ChainResult, RecordChainError};
use crate::observability::metrics;

/// Address plus interface of a deployed contract.
#[derive(Debug, Clone, PartialEq)]
pub struct ContractHandle {
    address: Address,
    abi: JsonAbi,
}

impl ContractHandle {
    pub fn new(address: Address, abi: JsonAbi) -> Self {
        Self { address, abi }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn abi(&self) -> &JsonAbi {
        &self.abi
    }

    /// First overload of `name`.
    pub fn function(&self, name: &str) -> ChainResult<&Function> {
        self.abi
            .function(name)
            .and_then(|overloads| overloads.first())
            .ok_or_else(|| RecordChainError::Abi(format!("contract has no function `{}`", name)))
    }

    pub fn has_function(&self, name: &str) -> bool {
        self.function(name).is_ok()
    }

    pub fn event(&self, name: &str) -> Option<&Event> {
        self.abi.event(name).and_then(|overloads| overloads.first())
    }

    /// Selector-prefixed calldata for `name(args)`.
    pub fn encode_call(&self, name: &str, args: &[DynSolValue]) -> ChainResult<Bytes> {
        let function = self.function(name)?;
        function
            .abi_encode_input(args)
            .map(Bytes::from)
            .map_err(|e| RecordChainError::Abi(format!("encoding `{}` arguments: {}", name, e)))
    }

    pub fn decode_output(&self, name: &str, data: &[u8]) -> ChainResult<Vec<DynSolValue>> {
        let function = self.function(name)?;
        function
            .abi_decode_output(data)
            .map_err(|e| RecordChainError::Abi(format!("decoding `{}` output: {}", name, e)))
    }

    /// Read-only call of `name(args)`, decoded against the ABI.
    pub async fn call<C: ChainClient>(
        &self,
        client: &C,
        name: &str,
        args: &[DynSolValue],
    ) -> ChainResult<Vec<DynSolValue>> {
        let input = self.encode_call(name, args)?;
        metrics::record_read_call(name);
        let output = client.call(self.address, input).await?;
        self.decode_output(name, &output)
    }
}

/// Creation code followed by ABI-encoded constructor arguments.
pub fn deployment_payload(
    bytecode: &Bytes,
    abi: &JsonAbi,
    constructor_args: &[DynSolValue],
) -> ChainResult<Bytes> {
    let mut payload = bytecode.to_vec();
    match &abi.constructor {
        Some(constructor) => {
            let encoded = constructor.abi_encode_input(constructor_args).map_err(|e| {
                RecordChainError::Abi(format!("encoding constructor arguments: {}", e))
            })?;
            payload.extend_from_slice(&encoded);
        }
        None if !constructor_args.is_empty() => {
            return Err(RecordChainError::Abi(format!(
                "contract takes no constructor arguments, {} given",
                constructor_args.len()
            )));
        }
        None => {}
    }
    Ok(payload.into())
}
