use crate::registry::{Access, Registry, RegistryKey};
use crate::{AccessError, Arch, SoftwareRecord};
use chrono::NaiveDate;
use tracing::{debug, trace};

/// Lists the installed software of both views, 64-bit entries first.
///
/// Any failure aborts the whole call; results of a view that already
/// succeeded are discarded.
pub fn installed_software_list<R: Registry>(registry: &R) -> Result<Vec<SoftwareRecord>, AccessError> {
    let mut software = software_list(registry, Arch::X64.base_path(), Arch::X64)?;
    let sw32 = software_list(registry, Arch::X32.base_path(), Arch::X32)?;
    software.extend(sw32);
    Ok(software)
}

/// Runs [`installed_software_list`] against the live `HKEY_LOCAL_MACHINE`.
#[cfg(windows)]
pub fn installed_software() -> Result<Vec<SoftwareRecord>, AccessError> {
    installed_software_list(&crate::WindowsRegistry::new())
}

/// Lists the software entries under one Uninstall key, tagging each with
/// `arch`.
///
/// A child without a readable `DisplayName` is skipped. A child that cannot
/// be opened at all fails the whole call.
pub fn software_list<R: Registry>(
    registry: &R,
    base_path: &str,
    arch: Arch,
) -> Result<Vec<SoftwareRecord>, AccessError> {
    debug!(path = base_path, %arch, "enumerating uninstall entries");

    let base = registry
        .open_key(base_path, Access::ReadAndEnumerate)
        .map_err(|source| AccessError::OpenKey {
            path: base_path.to_string(),
            source,
        })?;

    let subkeys = base.subkey_names().map_err(|source| AccessError::ListSubkeys {
        path: base_path.to_string(),
        source,
    })?;

    let mut software = Vec::new();
    for name in subkeys {
        let key = registry
            .open_key(&format!("{base_path}\\{name}"), Access::Read)
            .map_err(|source| AccessError::OpenSubkey {
                path: base_path.to_string(),
                subkey: name.clone(),
                source,
            })?;

        match read_record(&key, arch) {
            Some(record) => software.push(record),
            None => trace!(subkey = %name, "no DisplayName, skipping"),
        }
    }

    debug!(path = base_path, %arch, count = software.len(), "enumeration finished");
    Ok(software)
}

fn read_record<K: RegistryKey>(key: &K, arch: Arch) -> Option<SoftwareRecord> {
    let display_name = key.string_value("DisplayName").ok()?;

    let text = |name: &str| key.string_value(name).ok();
    let integer = |name: &str| key.integer_value(name).ok();

    Some(SoftwareRecord {
        display_name,
        display_version: text("DisplayVersion"),
        publisher: text("Publisher"),
        install_date: text("InstallDate").as_deref().and_then(parse_install_date),
        estimated_size: integer("EstimatedSize"),
        contact: text("Contact"),
        help_link: text("HelpLink"),
        install_source: text("InstallSource"),
        install_location: text("InstallLocation"),
        uninstall_string: text("UninstallString"),
        version_major: integer("VersionMajor"),
        version_minor: integer("VersionMinor"),
        arch,
    })
}

/// Parses an `InstallDate` value. Only exactly eight ASCII digits forming a
/// valid `YYYYMMDD` date are accepted.
pub fn parse_install_date(raw: &str) -> Option<NaiveDate> {
    if raw.len() != 8 || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    NaiveDate::parse_from_str(raw, "%Y%m%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{MemoryRegistry, Value};

    #[test]
    fn install_date_formats() {
        assert_eq!(
            parse_install_date("20230115"),
            NaiveDate::from_ymd_opt(2023, 1, 15)
        );
        assert_eq!(parse_install_date("2023-01-15"), None);
        assert_eq!(parse_install_date("abc"), None);
        assert_eq!(parse_install_date(""), None);
        assert_eq!(parse_install_date("2023115"), None);
        assert_eq!(parse_install_date("20231301"), None);
        assert_eq!(parse_install_date("20230230"), None);
        assert_eq!(parse_install_date(" 2023011"), None);
    }

    #[test]
    fn record_reads_every_field() {
        let mut reg = MemoryRegistry::new();
        let path = r"Base\{A}";
        reg.set_value(path, "DisplayName", "Foo");
        reg.set_value(path, "DisplayVersion", "1.2.3");
        reg.set_value(path, "Publisher", "Acme");
        reg.set_value(path, "InstallDate", "20240229");
        reg.set_value(path, "EstimatedSize", 2048u32);
        reg.set_value(path, "Contact", "support@acme.test");
        reg.set_value(path, "HelpLink", "https://acme.test/help");
        reg.set_value(path, "InstallSource", r"C:\Temp\foo");
        reg.set_value(path, "InstallLocation", r"C:\Program Files\Foo");
        reg.set_value(path, "UninstallString", r"C:\Program Files\Foo\uninstall.exe");
        reg.set_value(path, "VersionMajor", 1u32);
        reg.set_value(path, "VersionMinor", Value::Integer(2));

        let key = reg.open_key(path, Access::Read).unwrap();
        let record = read_record(&key, Arch::X32).unwrap();

        assert_eq!(record.display_name, "Foo");
        assert_eq!(record.display_version.as_deref(), Some("1.2.3"));
        assert_eq!(record.publisher.as_deref(), Some("Acme"));
        assert_eq!(record.install_date, NaiveDate::from_ymd_opt(2024, 2, 29));
        assert_eq!(record.estimated_size, Some(2048));
        assert_eq!(record.contact.as_deref(), Some("support@acme.test"));
        assert_eq!(record.help_link.as_deref(), Some("https://acme.test/help"));
        assert_eq!(record.install_source.as_deref(), Some(r"C:\Temp\foo"));
        assert_eq!(record.install_location.as_deref(), Some(r"C:\Program Files\Foo"));
        assert_eq!(
            record.uninstall_string.as_deref(),
            Some(r"C:\Program Files\Foo\uninstall.exe")
        );
        assert_eq!(record.version_major, Some(1));
        assert_eq!(record.version_minor, Some(2));
        assert_eq!(record.arch, Arch::X32);
    }

    #[test]
    fn display_name_of_wrong_type_yields_nothing() {
        let mut reg = MemoryRegistry::new();
        reg.set_value("Key", "DisplayName", 7u32);
        reg.set_value("Key", "Publisher", "Acme");

        let key = reg.open_key("Key", Access::Read).unwrap();
        assert!(read_record(&key, Arch::X64).is_none());
    }
}
