use std::net::IpAddr;
use std::str::FromStr;

use ipblock::gate::RequestKey;

/// The head of an inbound HTTP request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub peer: IpAddr,
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub trust_proxy: bool,
}

impl HttpRequest {
    /// Parses the request line and headers, stopping at the first empty line.
    pub fn parse(peer: IpAddr, head: &str, trust_proxy: bool) -> Result<Self, &'static str> {
        let mut lines = head.lines();
        let request_line = lines.next().ok_or("missing request line")?;

        let mut parts = request_line.split_whitespace();
        let method = parts.next().ok_or("missing method")?;
        let path = parts.next().ok_or("missing path")?;
        let version = parts.next().ok_or("missing protocol version")?;
        if !version.starts_with("HTTP/") {
            return Err("invalid protocol version");
        }

        let mut headers = Vec::new();
        for line in lines.take_while(|line| !line.is_empty()) {
            let (name, value) = line.split_once(':').ok_or("invalid header line")?;
            headers.push((name.trim().to_string(), value.trim().to_string()));
        }

        Ok(Self {
            peer,
            method: method.to_string(),
            path: path.to_string(),
            headers,
            trust_proxy,
        })
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// The address the request originates from.
    ///
    /// Behind a trusted proxy the first `X-Forwarded-For` hop wins, then
    /// `X-Real-IP`. Header values that aren't addresses are ignored.
    pub fn real_ip(&self) -> IpAddr {
        if self.trust_proxy {
            let forwarded = self
                .header("X-Forwarded-For")
                .and_then(|value| value.split(',').next())
                .and_then(|hop| IpAddr::from_str(hop.trim()).ok());
            if let Some(ip) = forwarded {
                return ip;
            }
            let real = self
                .header("X-Real-IP")
                .and_then(|value| IpAddr::from_str(value.trim()).ok());
            if let Some(ip) = real {
                return ip;
            }
        }
        self.peer
    }
}

impl RequestKey for HttpRequest {
    fn request_key(&self) -> Option<String> {
        Some(self.real_ip().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    const PEER: IpAddr = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1));

    #[test]
    fn test_parse_request_line_and_headers() {
        let head = "GET /index.html HTTP/1.1\r\nHost: example.com\r\nAccept: */*\r\n\r\n";
        let request = HttpRequest::parse(PEER, head, false).unwrap();

        assert_eq!(request.method, "GET");
        assert_eq!(request.path, "/index.html");
        assert_eq!(request.header("host"), Some("example.com"));
        assert_eq!(request.header("Accept"), Some("*/*"));
        assert_eq!(request.headers.len(), 2);
    }

    #[test]
    fn test_parse_missing_request_line() {
        assert_eq!(
            HttpRequest::parse(PEER, "", false),
            Err("missing request line")
        );
    }

    #[test]
    fn test_parse_missing_path() {
        assert_eq!(
            HttpRequest::parse(PEER, "GET\r\n\r\n", false),
            Err("missing path")
        );
    }

    #[test]
    fn test_parse_invalid_version() {
        assert_eq!(
            HttpRequest::parse(PEER, "GET / SPDY\r\n\r\n", false),
            Err("invalid protocol version")
        );
    }

    #[test]
    fn test_parse_invalid_header() {
        assert_eq!(
            HttpRequest::parse(PEER, "GET / HTTP/1.1\r\nbroken\r\n\r\n", false),
            Err("invalid header line")
        );
    }

    #[test]
    fn test_real_ip_ignores_headers_without_trusted_proxy() {
        let head = "GET / HTTP/1.1\r\nX-Forwarded-For: 1.2.3.4\r\n\r\n";
        let request = HttpRequest::parse(PEER, head, false).unwrap();
        assert_eq!(request.real_ip(), PEER);
        assert_eq!(request.request_key(), Some("10.0.0.1".to_string()));
    }

    #[test]
    fn test_real_ip_prefers_first_forwarded_hop() {
        let head = "GET / HTTP/1.1\r\nX-Real-IP: 9.9.9.9\r\nX-Forwarded-For: 1.2.3.4, 5.6.7.8\r\n\r\n";
        let request = HttpRequest::parse(PEER, head, true).unwrap();
        assert_eq!(request.request_key(), Some("1.2.3.4".to_string()));
    }

    #[test]
    fn test_real_ip_falls_back_to_real_ip_header() {
        let head = "GET / HTTP/1.1\r\nX-Forwarded-For: garbage\r\nX-Real-IP: 2001:db8::1\r\n\r\n";
        let request = HttpRequest::parse(PEER, head, true).unwrap();
        assert_eq!(request.request_key(), Some("2001:db8::1".to_string()));
    }

    #[test]
    fn test_real_ip_falls_back_to_peer() {
        let request = HttpRequest::parse(PEER, "GET / HTTP/1.1\r\n\r\n", true).unwrap();
        assert_eq!(request.real_ip(), PEER);
    }
}
