/// Registration traffic: commands sent, events classified, outcome changes.
/// Routed to `wps.log` and kept out of the component log.
pub const T_WPS: &str = "pixiejack::wps";

pub const SUBSYSTEM_LOGS: [(&str, &str); 1] = [(T_WPS, "wps.log")];
