//! Serial port discovery.

use serialport::{SerialPortInfo, SerialPortType, UsbPortInfo};

use super::error::TransportError;

/// One serial port visible to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortInfo {
    /// Device path or name (e.g., "/dev/ttyUSB0", "COM3").
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// Hardware identifier ("USB VID:PID=1A86:7523 SER=..." for USB ports).
    pub hardware_id: String,
}

impl From<SerialPortInfo> for PortInfo {
    fn from(info: SerialPortInfo) -> Self {
        let (description, hardware_id) = match &info.port_type {
            SerialPortType::UsbPort(usb) => (usb_description(usb), usb_hardware_id(usb)),
            SerialPortType::PciPort => ("PCI serial port".to_string(), "PCI".to_string()),
            SerialPortType::BluetoothPort => ("Bluetooth serial port".to_string(), "BLUETOOTH".to_string()),
            SerialPortType::Unknown => ("n/a".to_string(), "n/a".to_string()),
        };

        Self {
            name: info.port_name,
            description,
            hardware_id,
        }
    }
}

fn usb_description(usb: &UsbPortInfo) -> String {
    match (&usb.manufacturer, &usb.product) {
        (Some(m), Some(p)) => format!("{p} ({m})"),
        (None, Some(p)) => p.clone(),
        (Some(m), None) => m.clone(),
        (None, None) => "USB serial port".to_string(),
    }
}

fn usb_hardware_id(usb: &UsbPortInfo) -> String {
    let mut id = format!("USB VID:PID={:04X}:{:04X}", usb.vid, usb.pid);
    if let Some(serial) = &usb.serial_number {
        id.push_str(&format!(" SER={serial}"));
    }
    id
}

/// List the serial ports available on this host.
pub fn list_ports() -> Result<Vec<PortInfo>, TransportError> {
    let ports = serialport::available_ports()?;
    Ok(ports.into_iter().map(PortInfo::from).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn usb(serial: Option<&str>, manufacturer: Option<&str>, product: Option<&str>) -> SerialPortInfo {
        SerialPortInfo {
            port_name: "/dev/ttyUSB0".to_string(),
            port_type: SerialPortType::UsbPort(UsbPortInfo {
                vid: 0x1A86,
                pid: 0x7523,
                serial_number: serial.map(str::to_string),
                manufacturer: manufacturer.map(str::to_string),
                product: product.map(str::to_string),
            }),
        }
    }

    #[test]
    fn test_usb_port_info() {
        let info = PortInfo::from(usb(Some("A1B2"), Some("QinHeng"), Some("USB Serial")));
        assert_eq!(info.name, "/dev/ttyUSB0");
        assert_eq!(info.description, "USB Serial (QinHeng)");
        assert_eq!(info.hardware_id, "USB VID:PID=1A86:7523 SER=A1B2");
    }

    #[test]
    fn test_usb_port_without_strings() {
        let info = PortInfo::from(usb(None, None, None));
        assert_eq!(info.description, "USB serial port");
        assert_eq!(info.hardware_id, "USB VID:PID=1A86:7523");
    }

    #[test]
    fn test_unknown_port() {
        let info = PortInfo::from(SerialPortInfo {
            port_name: "/dev/ttyS0".to_string(),
            port_type: SerialPortType::Unknown,
        });
        assert_eq!(info.description, "n/a");
    }
}
