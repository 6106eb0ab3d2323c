//! Convenience macros for working with KNX addresses.

/// Creates a [`GroupAddress`](crate::addressing::GroupAddress) from 3-level notation.
///
/// # Syntax
///
/// ```text
/// ga!(area/line/member)
/// ```
///
/// Where `area` is 0-31, `line` is 0-7 and `member` is 0-255.
///
/// # Examples
///
/// ```rust
/// use knx_ip_node::ga;
///
/// let temperature = ga!(10/6/5);
/// assert_eq!(temperature.raw(), 0x5605);
/// ```
///
/// # Compile-Time Validation
///
/// ```compile_fail
/// // area > 31
/// let addr = knx_ip_node::ga!(32/0/0);
/// ```
///
/// ```compile_fail
/// // line > 7
/// let addr = knx_ip_node::ga!(1/8/0);
/// ```
#[macro_export]
macro_rules! ga {
    ($area:literal / $line:literal / $member:literal) => {{
        const _: () = {
            if $area > 31 {
                panic!("Group area must be 0-31");
            }
            if $line > 7 {
                panic!("Group line must be 0-7");
            }
            if $member > 255 {
                panic!("Group member must be 0-255");
            }
        };

        // AAAAALLL MMMMMMMM
        const RAW: u16 = (($area & 0x1F) << 11) | (($line & 0x07) << 8) | ($member & 0xFF);
        $crate::addressing::GroupAddress::from(RAW)
    }};
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_ga_macro() {
        let addr = ga!(10 / 6 / 5);
        assert_eq!(addr.area(), 10);
        assert_eq!(addr.line(), 6);
        assert_eq!(addr.member(), 5);

        let addr = ga!(31 / 7 / 255);
        assert_eq!(addr.raw(), 0xFFFF);
    }
}
