//! Node identity: long addresses and discovered nodes

use std::fmt;

/// 8-byte long address of a node, unique for the life of the device
///
/// Used verbatim as the registry key; two distinct radios can never map to
/// the same entry.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeAddress([u8; 8]);

impl NodeAddress {
    /// Wrap the raw address bytes, most significant byte first
    pub const fn new(bytes: [u8; 8]) -> Self {
        Self(bytes)
    }

    /// Raw address bytes
    pub const fn as_bytes(&self) -> &[u8; 8] {
        &self.0
    }
}

impl fmt::Display for NodeAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            write!(f, "{byte:02X}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for NodeAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeAddress({self})")
    }
}

/// A discovered node: long address plus its configured identifier string
///
/// Nodes are created by discovery events and never mutated; re-discovery
/// replaces the registry entry wholesale.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Node {
    /// Long address, the node's permanent identity
    pub address: NodeAddress,
    /// Human-readable identifier configured on the node
    pub identifier: String,
}

impl Node {
    /// Build a node record from a discovery event
    pub fn new(address: NodeAddress, identifier: impl Into<String>) -> Self {
        Self {
            address,
            identifier: identifier.into(),
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.identifier, self.address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_hex_display() {
        let addr = NodeAddress::new([0x00, 0x13, 0xA2, 0x00, 0x40, 0xA1, 0xB2, 0xC3]);
        assert_eq!(addr.to_string(), "0013A20040A1B2C3");
        assert_eq!(format!("{addr:?}"), "NodeAddress(0013A20040A1B2C3)");
    }

    #[test]
    fn test_node_equality_covers_identifier() {
        let addr = NodeAddress::new([1, 2, 3, 4, 5, 6, 7, 8]);
        let a = Node::new(addr, "pump-room");
        let b = Node::new(addr, "pump-room");
        let c = Node::new(addr, "greenhouse");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.to_string(), "pump-room (0102030405060708)");
    }
}
