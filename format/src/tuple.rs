//! Tuples of codecs encode tuples of values, one element after another.
//!
//! The reported `count` is the number of elements.

use crate::{Codec, EncodeResult, Error};
use bytes::{Buf, BufMut};
use paste::paste;

macro_rules! impl_tuple {
    ($($index:literal),*) => {
        paste! {
            impl<$( [<V $index>], [<C $index>]: Codec<[<V $index>]> ),*>
                Codec<( $( [<V $index>], )* )> for ( $( [<C $index>], )* )
            {
                #[inline]
                fn encode(
                    &self,
                    value: &( $( [<V $index>], )* ),
                    buf: &mut dyn BufMut,
                ) -> Result<EncodeResult, Error> {
                    const ARITY: usize = [$( $index ),*].len();
                    let mut bytes = 0;
                    $( bytes += self.$index.encode(&value.$index, buf)?.bytes; )*
                    Ok(EncodeResult::new(ARITY, bytes))
                }

                #[inline]
                fn decode(&self, buf: &mut dyn Buf) -> Result<( $( [<V $index>], )* ), Error> {
                    Ok(( $( self.$index.decode(buf)?, )* ))
                }

                fn fixed_size(&self) -> Option<usize> {
                    Some(0 $( + self.$index.fixed_size()? )*)
                }
            }
        }
    };
}

// Arities 1 through 12
impl_tuple!(0);
impl_tuple!(0, 1);
impl_tuple!(0, 1, 2);
impl_tuple!(0, 1, 2, 3);
impl_tuple!(0, 1, 2, 3, 4);
impl_tuple!(0, 1, 2, 3, 4, 5);
impl_tuple!(0, 1, 2, 3, 4, 5, 6);
impl_tuple!(0, 1, 2, 3, 4, 5, 6, 7);
impl_tuple!(0, 1, 2, 3, 4, 5, 6, 7, 8);
impl_tuple!(0, 1, 2, 3, 4, 5, 6, 7, 8, 9);
impl_tuple!(0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10);
impl_tuple!(0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11);
