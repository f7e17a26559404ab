//! 通知送信元IPの正規化
//!
//! デュアルスタックのリスナーはIPv4の送信元を`::ffff:a.b.c.d`として受け取るため、
//! 許可リストと比較する前にIPv4へ戻す。

use std::net::IpAddr;

/// IPv4-mapped IPv6をIPv4に変換する（それ以外はそのまま）
pub fn normalize_ip(addr: IpAddr) -> IpAddr {
    match addr {
        IpAddr::V6(v6) => v6.to_ipv4_mapped().map_or(IpAddr::V6(v6), IpAddr::V4),
        v4 => v4,
    }
}
