//! Contract interfaces the engine encodes against, plus the canonical deployment addresses.

use alloy::primitives::{address, Address};
use alloy::sol;
use serde::{Deserialize, Serialize};

/// Head of the on-chain owners linked list.
pub const SENTINEL_OWNERS: Address = address!("0x0000000000000000000000000000000000000001");

sol! {
    /// Safe singleton surface used for reads, owner management and execution.
    ///
    /// Reference: <https://github.com/safe-global/safe-smart-account/blob/v1.4.1/contracts/Safe.sol>
    #[derive(Debug, PartialEq, Eq)]
    interface ISafe {
        function getOwners() external view returns (address[] memory);
        function getThreshold() external view returns (uint256);
        function nonce() external view returns (uint256);
        function VERSION() external view returns (string memory);

        function addOwnerWithThreshold(address owner, uint256 threshold) external;
        function removeOwner(address prevOwner, address owner, uint256 threshold) external;
        function swapOwner(address prevOwner, address oldOwner, address newOwner) external;
        function changeThreshold(uint256 threshold) external;

        function setup(
            address[] calldata owners,
            uint256 threshold,
            address to,
            bytes calldata data,
            address fallbackHandler,
            address paymentToken,
            uint256 payment,
            address paymentReceiver
        ) external;

        function execTransaction(
            address to,
            uint256 value,
            bytes calldata data,
            uint8 operation,
            uint256 safeTxGas,
            uint256 baseGas,
            uint256 gasPrice,
            address gasToken,
            address refundReceiver,
            bytes memory signatures
        ) external payable returns (bool success);
    }

    #[derive(Debug, PartialEq, Eq)]
    interface IMultiSend {
        function multiSend(bytes memory transactions) external payable;
    }

    #[derive(Debug, PartialEq, Eq)]
    interface ISafeProxyFactory {
        function proxyCreationCode() external pure returns (bytes memory);
        function createProxyWithNonce(address singleton, bytes memory initializer, uint256 saltNonce)
            external
            returns (address proxy);
    }

    #[derive(Debug, PartialEq, Eq)]
    interface IERC20 {
        function transfer(address to, uint256 amount) external returns (bool);
    }
}

sol! {
    #[derive(Debug)]
    struct SafeTx {
        address to;
        uint256 value;
        bytes data;
        uint8 operation;
        uint256 safeTxGas;
        uint256 baseGas;
        uint256 gasPrice;
        address gasToken;
        address refundReceiver;
        uint256 nonce;
    }

    #[derive(Debug)]
    struct SafeMessage {
        bytes message;
    }
}

/// Pre-1.0.0 accounts hash `dataGas` where later versions hash `baseGas`.
pub mod legacy {
    use alloy::sol;

    sol! {
        #[derive(Debug)]
        struct SafeTx {
            address to;
            uint256 value;
            bytes data;
            uint8 operation;
            uint256 safeTxGas;
            uint256 dataGas;
            uint256 gasPrice;
            address gasToken;
            address refundReceiver;
            uint256 nonce;
        }
    }
}

/// Addresses of the helper contracts a chain exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractSet {
    pub multi_send: Address,
    pub proxy_factory: Address,
    pub singleton: Address,
    pub fallback_handler: Address,
}

impl Default for ContractSet {
    /// Canonical v1.4.1 deployments.
    fn default() -> Self {
        Self {
            multi_send: address!("0x38869bf66a61cF6bDB996A6aE40D5853Fd43B526"),
            proxy_factory: address!("0x4e1DCf7AD4e460CfD30791CCC4F9c8a4f820ec67"),
            singleton: address!("0x41675C099F32341bf84BFc5382aF534df5C7461a"),
            fallback_handler: address!("0xfd0732Dc9E303f09fCEf3a7388Ad10A83459Ec99"),
        }
    }
}

impl ContractSet {
    /// Same factory and helpers, L2 singleton (emits events for indexers).
    pub fn l2() -> Self {
        Self {
            singleton: address!("0x29fcB43b46531BcA003ddC8FCB67FFE91900C762"),
            ..Self::default()
        }
    }
}
