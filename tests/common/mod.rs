//! Shared fixtures for the integration tests.
//!
//! ```rust,ignore
//! mod common;
//! use common::*;
//! ```

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use fqcn_converter::prelude::*;
use tempfile::TempDir;

/// A playbook mixing short names, an FQCN, a parameter that shares a
/// module's name and a block.
pub const MIXED_PLAYBOOK: &str = "\
---
# Web servers
- name: Configure web servers
  hosts: webservers
  become: true

  tasks:
    - name: Install nginx
      package:
        name: nginx
        state: present

    - name: Create deploy user
      user:
        name: deploy
        group: www-data   # parameter, not a module

    - name: Already compliant
      ansible.builtin.file:
        path: /srv/www
        state: directory

    - block:
        - name: Render config
          template:
            src: nginx.conf.j2
            dest: /etc/nginx/nginx.conf
      rescue:
        - debug:
            msg: rendering failed

  handlers:
    - name: Restart nginx
      service:
        name: nginx
        state: restarted
";

/// Task file whose only module is unknown to the table.
pub const UNKNOWN_MODULE_TASKS: &str = "- name: t\n  unknown_mod: {}\n";

/// Not YAML.
pub const BROKEN_YAML: &str = "- name: broken\n  copy: [unterminated\n";

/// Bundled mapping table.
pub fn bundled() -> Arc<MappingTable> {
    Arc::new(MappingTable::bundled())
}

/// Converter over the bundled table, without backups.
pub fn converter() -> Converter {
    Converter::new(bundled()).with_backup(false)
}

/// Validator over the bundled table.
pub fn validator() -> Validator {
    Validator::new(bundled())
}

/// Temporary directory holding Ansible content.
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Writes `content` to `relative`, creating parent directories.
    pub fn write(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.dir.path().join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent dir");
        }
        std::fs::write(&path, content).expect("write fixture");
        path
    }

    pub fn read(&self, relative: &str) -> String {
        std::fs::read_to_string(self.dir.path().join(relative)).expect("read fixture")
    }

    /// Creates a minimal project: a playbook plus one role task file.
    pub fn project(&self, name: &str, playbook: &str) -> PathBuf {
        self.write(&format!("{}/site.yml", name), playbook);
        self.write(
            &format!("{}/roles/common/tasks/main.yml", name),
            "- name: Ping\n  ping:\n",
        );
        self.dir.path().join(name)
    }
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new()
    }
}
