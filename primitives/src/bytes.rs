// Copyright 2019 Conflux Foundation. All rights reserved.
// Conflux is free software and distributed under GNU General Public License.
// See http://www.gnu.org/licenses/

/// Slice of bytes to underlying memory.
pub type Bytes = Vec<u8>;
