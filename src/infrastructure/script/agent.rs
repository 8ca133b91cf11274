//! Aragon Agent `execute` wrapper

use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::{sol, SolCall};

use crate::domain::abi::{FunctionSignature, ParamSpec};

sol! {
    /// Aragon Agent: perform a call on behalf of the DAO
    function execute(address _target, uint256 _ethValue, bytes _data);
}

/// Selector of `execute(address,uint256,bytes)`
pub const EXECUTE_SELECTOR: [u8; 4] = [0xb6, 0x1d, 0x27, 0xf6];

/// Calldata for `execute(target, 0, inner)`
pub fn wrap_execute(target: Address, inner: Vec<u8>) -> Bytes {
    executeCall {
        _target: target,
        _ethValue: U256::ZERO,
        _data: inner.into(),
    }
    .abi_encode()
    .into()
}

/// Built-in ABI entry for `execute`, used when the agent's own ABI is missing it
pub fn execute_function() -> FunctionSignature {
    let param = |name: &str, kind: &str| ParamSpec {
        name: name.to_string(),
        kind: kind.to_string(),
    };
    FunctionSignature {
        selector: EXECUTE_SELECTOR,
        name: "execute".to_string(),
        signature: "execute(address,uint256,bytes)".to_string(),
        inputs: vec![
            param("_target", "address"),
            param("_ethValue", "uint256"),
            param("_data", "bytes"),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::abi::compute_selector;
    use alloy_primitives::address;

    #[test]
    fn test_selector_constant() {
        assert_eq!(EXECUTE_SELECTOR, executeCall::SELECTOR);
        assert_eq!(
            EXECUTE_SELECTOR,
            compute_selector(&execute_function().signature)
        );
    }

    #[test]
    fn test_wrap_execute_layout() {
        let target = address!("0xeCb456EA5365865EbAb8a2661B0c503410e9B347");
        let wrapped = wrap_execute(target, vec![0xde, 0xad, 0xbe, 0xef]);

        assert_eq!(&wrapped[..4], &EXECUTE_SELECTOR);
        // target word, value word, offset word, length word, one padded data word
        assert_eq!(wrapped.len(), 4 + 32 * 5);
        assert_eq!(&wrapped[16..36], target.as_slice());
        assert!(wrapped[36..68].iter().all(|&b| b == 0));
        assert_eq!(&wrapped[132..136], &[0xde, 0xad, 0xbe, 0xef]);
    }
}
