//! Access control
//!
//! Evaluates endpoint ACL rules against a client's network address. View and
//! upload permissions are consulted independently per endpoint.

use std::net::IpAddr;

use crate::config::AclRule;

/// Check whether a client address is allowed by the given rule.
pub fn is_allowed(addr: IpAddr, rule: &AclRule) -> bool {
    match rule {
        AclRule::All => true,
        AclRule::None => false,
        AclRule::Local => addr.is_loopback(),
        AclRule::Addrs(addrs) => addrs.contains(&addr),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_and_none() {
        let addr: IpAddr = "203.0.113.7".parse().unwrap();
        assert!(is_allowed(addr, &AclRule::All));
        assert!(!is_allowed(addr, &AclRule::None));
    }

    #[test]
    fn test_local_matches_loopback_only() {
        assert!(is_allowed("127.0.0.1".parse().unwrap(), &AclRule::Local));
        assert!(is_allowed("::1".parse().unwrap(), &AclRule::Local));
        assert!(!is_allowed("192.168.1.10".parse().unwrap(), &AclRule::Local));
    }

    #[test]
    fn test_addr_list_matches_exactly() {
        let rule = AclRule::Addrs(vec!["10.0.0.5".parse().unwrap()]);
        assert!(is_allowed("10.0.0.5".parse().unwrap(), &rule));
        assert!(!is_allowed("10.0.0.6".parse().unwrap(), &rule));
    }
}
