//! 端口名自然排序
//!
//! 排序键：结尾数字串（升序）→ 无结尾数字的排在最后 → 全名小写字典序。
//!
//! ```text
//! COM2, COM10, COM1, BT-Serial  →  COM1, COM2, COM10, BT-Serial
//! ```

use std::cmp::Ordering;

/// 提取名称结尾的十进制数字串
///
/// 没有结尾数字时返回 `None`。数字串不做整数转换，长度不受限。
pub fn trailing_number(name: &str) -> Option<&str> {
    let stem = name.trim_end_matches(|c: char| c.is_ascii_digit());
    let digits = &name[stem.len()..];
    (!digits.is_empty()).then_some(digits)
}

/// 排序键
///
/// `None` 大于任何 `Some`，因此没有结尾数字的端口排在最后。
pub fn port_sort_key(name: &str) -> (PortNumber, String) {
    (PortNumber::from_name(name), name.to_lowercase())
}

/// 结尾数字（去掉前导零的数字串），`None` 视为正无穷
///
/// 数值比较：先比位数，位数相同再按字典序。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortNumber(pub Option<String>);

impl PortNumber {
    pub fn from_name(name: &str) -> Self {
        Self(trailing_number(name).map(|digits| digits.trim_start_matches('0').to_string()))
    }
}

impl Ord for PortNumber {
    fn cmp(&self, other: &Self) -> Ordering {
        match (&self.0, &other.0) {
            (Some(a), Some(b)) => a.len().cmp(&b.len()).then_with(|| a.cmp(b)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }
}

impl PartialOrd for PortNumber {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// 按自然顺序排序端口名
pub fn natural_sort(mut ports: Vec<String>) -> Vec<String> {
    ports.sort_by_cached_key(|name| port_sort_key(name));
    ports
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn names(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_trailing_number() {
        assert_eq!(trailing_number("COM10"), Some("10"));
        assert_eq!(trailing_number("/dev/ttyUSB0"), Some("0"));
        assert_eq!(trailing_number("BT-Serial"), None);
        assert_eq!(trailing_number(""), None);
        assert_eq!(trailing_number("rfcomm-2a"), None);
    }

    #[test]
    fn test_natural_sort_windows_ports() {
        let sorted = natural_sort(names(&["COM2", "COM10", "COM1", "BT-Serial"]));
        assert_eq!(sorted, names(&["COM1", "COM2", "COM10", "BT-Serial"]));
    }

    #[test]
    fn test_ties_broken_case_insensitively() {
        let sorted = natural_sort(names(&["ttyUSB1", "COM1", "b-port", "A-port"]));
        assert_eq!(sorted, names(&["COM1", "ttyUSB1", "A-port", "b-port"]));
    }

    #[test]
    fn test_huge_suffix_is_still_numbered() {
        let sorted = natural_sort(names(&["BT-Serial", "X99999999999999999999999"]));
        assert_eq!(sorted, names(&["X99999999999999999999999", "BT-Serial"]));

        let sorted = natural_sort(names(&["X100000000000000000000", "COM3", "Y99999999999999999999"]));
        assert_eq!(
            sorted,
            names(&["COM3", "Y99999999999999999999", "X100000000000000000000"])
        );
    }

    #[test]
    fn test_leading_zeros_compare_numerically() {
        assert_eq!(PortNumber::from_name("COM007"), PortNumber::from_name("COM7"));
        let sorted = natural_sort(names(&["COM010", "COM9", "COM0"]));
        assert_eq!(sorted, names(&["COM0", "COM9", "COM010"]));
    }

    proptest! {
        #[test]
        fn prop_sort_is_idempotent(ports in proptest::collection::vec("[A-Za-z/-]{0,6}[0-9]{0,3}", 0..12)) {
            let once = natural_sort(ports);
            let twice = natural_sort(once.clone());
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn prop_order_matches_integer_order(a in 0u64..u64::MAX, b in 0u64..u64::MAX) {
            let pa = PortNumber::from_name(&format!("COM{}", a));
            let pb = PortNumber::from_name(&format!("COM{}", b));
            prop_assert_eq!(pa.cmp(&pb), a.cmp(&b));
        }

        #[test]
        fn prop_numbered_ports_precede_unnumbered(ports in proptest::collection::vec("[A-Za-z]{1,4}[0-9]{0,2}", 1..12)) {
            let sorted = natural_sort(ports);
            let first_unnumbered = sorted.iter().position(|p| trailing_number(p).is_none());
            if let Some(idx) = first_unnumbered {
                prop_assert!(sorted[idx..].iter().all(|p| trailing_number(p).is_none()));
            }
        }
    }
}
