//! Serial port enumeration (`ncmon ports`)

use serialport::SerialPortType;

use ncmon_core::prelude::*;

/// One serial port visible to the OS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortInfo {
    pub name: String,
    pub kind: PortKind,
}

impl PortInfo {
    /// Short human description, e.g. `USB 10c4:ea60 CP2102N`.
    pub fn description(&self) -> String {
        match &self.kind {
            PortKind::Usb {
                vid,
                pid,
                product,
                serial_number,
            } => {
                let mut text = format!("USB {:04x}:{:04x}", vid, pid);
                if let Some(product) = product {
                    text.push(' ');
                    text.push_str(product);
                }
                if let Some(sn) = serial_number {
                    text.push_str(&format!(" (SN {})", sn));
                }
                text
            }
            PortKind::Pci => "PCI".to_string(),
            PortKind::Bluetooth => "Bluetooth".to_string(),
            PortKind::Unknown => "unknown".to_string(),
        }
    }
}

/// Bus a port sits on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortKind {
    Usb {
        vid: u16,
        pid: u16,
        product: Option<String>,
        serial_number: Option<String>,
    },
    Pci,
    Bluetooth,
    Unknown,
}

impl From<&SerialPortType> for PortKind {
    fn from(kind: &SerialPortType) -> Self {
        match kind {
            SerialPortType::UsbPort(usb) => PortKind::Usb {
                vid: usb.vid,
                pid: usb.pid,
                product: usb.product.clone(),
                serial_number: usb.serial_number.clone(),
            },
            SerialPortType::PciPort => PortKind::Pci,
            SerialPortType::BluetoothPort => PortKind::Bluetooth,
            SerialPortType::Unknown => PortKind::Unknown,
        }
    }
}

/// List the serial ports currently available, sorted by name.
pub fn list_ports() -> Result<Vec<PortInfo>> {
    let ports = serialport::available_ports().map_err(|e| Error::serial(e.to_string()))?;
    let mut infos: Vec<PortInfo> = ports
        .iter()
        .map(|p| PortInfo {
            name: p.port_name.clone(),
            kind: PortKind::from(&p.port_type),
        })
        .collect();
    infos.sort_by(|a, b| a.name.cmp(&b.name));
    debug!("Found {} serial port(s)", infos.len());
    Ok(infos)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usb_description() {
        let info = PortInfo {
            name: "/dev/ttyUSB0".to_string(),
            kind: PortKind::Usb {
                vid: 0x10c4,
                pid: 0xea60,
                product: Some("CP2102N".to_string()),
                serial_number: Some("0001".to_string()),
            },
        };
        assert_eq!(info.description(), "USB 10c4:ea60 CP2102N (SN 0001)");
    }

    #[test]
    fn test_non_usb_descriptions() {
        let info = |kind| PortInfo {
            name: "COM1".to_string(),
            kind,
        };
        assert_eq!(info(PortKind::Pci).description(), "PCI");
        assert_eq!(info(PortKind::Unknown).description(), "unknown");
    }
}
