//! Static service table
//!
//! | id              | aliases                    | server                 | port | request            |
//! |-----------------|----------------------------|------------------------|------|--------------------|
//! | `ezip`          | `ez-ip`                    | www.EZ-IP.Net          | 80   | `/members/update/` |
//! | `pgpow`         | `penguinpowered`, `justlinux` | www.penguinpowered.com | 2345 | `update`        |
//! | `dhs`           |                            | members.dhs.org        | 80   | `/nic/hosts`       |
//! | `dyndns`        |                            | members.dyndns.org     | 80   | `/nic/dyndns/`     |
//! | `dyndns-static` | `dyndns-stat`              | members.dyndns.org     | 80   | `/nic/statdns/`    |

use ezupdate_core::{ServiceDescriptor, ServiceRegistry};

use crate::{DhsDriver, DynDnsDriver, EzipDriver, PgpowDriver};

/// Service used when none is selected
pub const DEFAULT_SERVICE: &str = "ezip";

static EZIP: EzipDriver = EzipDriver;
static DYNDNS: DynDnsDriver = DynDnsDriver;
static PGPOW: PgpowDriver = PgpowDriver;
static DHS: DhsDriver = DhsDriver::new();

/// Every supported service
pub static SERVICES: [ServiceDescriptor; 5] = [
    ServiceDescriptor {
        id: "ezip",
        aliases: &["ez-ip"],
        name: "EZ-IP",
        default_server: "www.EZ-IP.Net",
        default_port: "80",
        default_request: "/members/update/",
        driver: &EZIP,
    },
    ServiceDescriptor {
        id: "pgpow",
        aliases: &["penguinpowered", "justlinux"],
        name: "justlinux (penguinpowered)",
        default_server: "www.penguinpowered.com",
        default_port: "2345",
        default_request: "update",
        driver: &PGPOW,
    },
    ServiceDescriptor {
        id: "dhs",
        aliases: &[],
        name: "DHS",
        default_server: "members.dhs.org",
        default_port: "80",
        default_request: "/nic/hosts",
        driver: &DHS,
    },
    ServiceDescriptor {
        id: "dyndns",
        aliases: &[],
        name: "DynDNS",
        default_server: "members.dyndns.org",
        default_port: "80",
        default_request: "/nic/dyndns/",
        driver: &DYNDNS,
    },
    ServiceDescriptor {
        id: "dyndns-static",
        aliases: &["dyndns-stat"],
        name: "DynDNS static",
        default_server: "members.dyndns.org",
        default_port: "80",
        default_request: "/nic/statdns/",
        driver: &DYNDNS,
    },
];

/// Registry over [`SERVICES`]
pub fn registry() -> ServiceRegistry {
    ServiceRegistry::new(&SERVICES)
}
