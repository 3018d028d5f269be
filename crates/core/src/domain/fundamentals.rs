use serde::{Deserialize, Serialize};

/// Company fundamentals for one ticker. Absent metrics stay `None`; they are never zero-filled.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FundamentalsSnapshot {
    #[serde(rename = "PE", default, skip_serializing_if = "Option::is_none")]
    pub pe_ratio: Option<f64>,
    #[serde(rename = "EPS", default, skip_serializing_if = "Option::is_none")]
    pub eps: Option<f64>,
    #[serde(rename = "MarketCap", default, skip_serializing_if = "Option::is_none")]
    pub market_cap: Option<f64>,
    #[serde(rename = "Sector", default, skip_serializing_if = "Option::is_none")]
    pub sector: Option<String>,
    #[serde(rename = "ROE", default, skip_serializing_if = "Option::is_none")]
    pub return_on_equity: Option<f64>,
}

impl FundamentalsSnapshot {
    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    /// Present metrics as `(label, value)` pairs in display order.
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        let mut out = Vec::new();
        if let Some(v) = self.pe_ratio {
            out.push(("PE", v.to_string()));
        }
        if let Some(v) = self.eps {
            out.push(("EPS", v.to_string()));
        }
        if let Some(v) = self.market_cap {
            out.push(("MarketCap", v.to_string()));
        }
        if let Some(v) = self.sector.as_deref().filter(|s| !s.is_empty()) {
            out.push(("Sector", v.to_string()));
        }
        if let Some(v) = self.return_on_equity {
            out.push(("ROE", v.to_string()));
        }
        out
    }

    /// `"PE: 28.1, EPS: 6.1, ..."`; empty when nothing is known.
    pub fn display_line(&self) -> String {
        self.entries()
            .into_iter()
            .map(|(k, v)| format!("{k}: {v}"))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn omits_absent_metrics_when_serialized() {
        let f = FundamentalsSnapshot {
            pe_ratio: Some(28.5),
            sector: Some("TECHNOLOGY".to_string()),
            ..Default::default()
        };
        let v = serde_json::to_value(&f).unwrap();
        assert_eq!(v, serde_json::json!({"PE": 28.5, "Sector": "TECHNOLOGY"}));
        assert_eq!(f.display_line(), "PE: 28.5, Sector: TECHNOLOGY");
    }

    #[test]
    fn empty_snapshot_has_no_entries() {
        let f = FundamentalsSnapshot::default();
        assert!(f.is_empty());
        assert_eq!(f.display_line(), "");
    }
}
