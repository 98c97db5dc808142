// ABOUTME: Integration tests for validated domain types.
// ABOUTME: Device paths, roles, firmware bundles, and batch selection rules.

use perista::types::{
    Batch, BatchSelectionError, Device, DeviceMode, DevicePath, DevicePathError, FirmwareBundle,
    FirmwareVersion, Role,
};

mod device_paths {
    use super::*;

    #[test]
    fn accepts_mount_points_and_serial_ports() {
        assert!(DevicePath::new("/media/user/DEV0").is_ok());
        assert!(DevicePath::new("/dev/ttyACM0").is_ok());
    }

    #[test]
    fn rejects_empty() {
        assert!(matches!(DevicePath::new(""), Err(DevicePathError::Empty)));
    }
}

mod roles {
    use super::*;

    #[test]
    fn tokens_are_uppercase() {
        assert_eq!(Role::Primary.as_token(), "PRIMARY");
        assert_eq!(Role::Secondary.as_token(), "SECONDARY");
    }

    #[test]
    fn serde_uses_lowercase() {
        let json = serde_json::to_string(&Role::Primary).unwrap();
        assert_eq!(json, "\"primary\"");
        let role: Role = serde_json::from_str("\"secondary\"").unwrap();
        assert_eq!(role, Role::Secondary);
    }
}

mod batches {
    use super::*;

    fn device(path: &str) -> Device {
        Device::new(DevicePath::new(path).unwrap(), path)
            .with_role(Role::Primary)
            .with_mode(DeviceMode::Bootloader)
    }

    #[test]
    fn single_device_batch_is_valid() {
        let batch = Batch::new(vec![device("/a")]).unwrap();
        assert_eq!(batch.len(), 1);
    }

    #[test]
    fn more_than_a_pair_is_rejected() {
        let result = Batch::new(vec![device("/a"), device("/b"), device("/c")]);
        assert!(matches!(result, Err(BatchSelectionError::TooMany(3))));
    }

    #[test]
    fn duplicate_paths_are_rejected() {
        let result = Batch::new(vec![device("/a"), device("/a")]);
        assert!(matches!(result, Err(BatchSelectionError::DuplicatePath(_))));
    }

    #[test]
    fn role_assignment_check_covers_every_device() {
        let with_roles = Batch::new(vec![device("/a")]).unwrap();
        assert!(with_roles.all_roles_assigned());

        let mut bare = Device::new(DevicePath::new("/b").unwrap(), "b");
        bare.role = None;
        let mixed = Batch::new(vec![device("/a"), bare]).unwrap();
        assert!(!mixed.all_roles_assigned());
    }
}

mod firmware {
    use super::*;

    #[test]
    fn version_validates_token_shape() {
        assert!(FirmwareVersion::new("2.4.1").is_ok());
        assert!(FirmwareVersion::new("2024.08-rc1").is_ok());
        assert!(FirmwareVersion::new("").is_err());
        assert!(FirmwareVersion::new("1.0 beta").is_err());
    }

    #[test]
    fn bundle_open_requires_non_empty_directory() {
        let dir = tempfile::tempdir().unwrap();
        let version = FirmwareVersion::new("1.0.0").unwrap();

        let empty = FirmwareBundle::open(version.clone(), dir.path());
        assert!(empty.is_err());

        std::fs::write(dir.path().join("firmware.uf2"), b"uf2").unwrap();
        let bundle = FirmwareBundle::open(version, dir.path()).unwrap();
        assert_eq!(bundle.version.as_str(), "1.0.0");
    }
}
