use std::marker::PhantomData;

use crate::{Dump, Dumper};

impl<T: Dump, const N: usize> Dump for [T; N] {
	fn dump_data(&self, dumper: &mut Dumper) {
		for value in self {
			value.dump_data(dumper);
		}
	}
}

impl<T: Dump> Dump for Option<T> {
	fn dump_data(&self, dumper: &mut Dumper) {
		if let Some(value) = self {
			value.dump_data(dumper);
		}
	}
}

impl<T: ?Sized> Dump for PhantomData<T> {}

macro_rules! impl_tuple {
	($($index:tt : $ty:ident),+) => {
		impl<$($ty: Dump),+> Dump for ($($ty,)+) {
			fn dump_data(&self, dumper: &mut Dumper) {
				$(self.$index.dump_data(dumper);)+
			}
		}
	};
}

impl_tuple!(0: T0);
impl_tuple!(0: T0, 1: T1);
impl_tuple!(0: T0, 1: T1, 2: T2);
impl_tuple!(0: T0, 1: T1, 2: T2, 3: T3);
